//! Node registry: the name to MAC address table read from the config file.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// In-memory mapping from node name to MAC address.
///
/// MAC strings are kept exactly as written; the helper is the one that
/// decides whether they are usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    nodes: BTreeMap<String, String>,
}

impl Registry {
    /// Open `path` and parse it as a node table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::ConfigNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(BufReader::new(file))
    }

    /// Build a registry from a line-oriented source.
    ///
    /// Each line is split on whitespace. Lines with fewer than two tokens, or
    /// whose first token starts with `#`, are skipped. Otherwise the first
    /// token names the node and the second is its MAC; later lines win.
    /// Bytes that are not UTF-8 are replaced rather than rejected.
    pub fn parse(reader: impl BufRead) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        for line in reader.split(b'\n') {
            let line = line?;
            let line = String::from_utf8_lossy(&line);
            let mut tokens = line.split_whitespace();
            let (Some(name), Some(mac)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            if name.starts_with('#') {
                continue;
            }
            nodes.insert(name.to_string(), mac.to_string());
        }
        Ok(Self { nodes })
    }

    /// MAC for `name`, if the node is configured.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.nodes.get(name).map(String::as_str)
    }

    /// Iterate `(name, mac)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.iter().map(|(name, mac)| (name.as_str(), mac.as_str()))
    }

    /// Node names in registry order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Number of configured nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node survived parsing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<N: Into<String>, M: Into<String>> FromIterator<(N, M)> for Registry {
    fn from_iter<I: IntoIterator<Item = (N, M)>>(iter: I) -> Self {
        Self {
            nodes: iter
                .into_iter()
                .map(|(name, mac)| (name.into(), mac.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> Registry {
        Registry::parse(text.as_bytes()).expect("in-memory parse cannot fail")
    }

    #[test]
    fn maps_first_token_to_second() {
        let reg = parse("node1 00:11:22:33:44:55\nnode2\t\taa:bb:cc:dd:ee:ff  trailing junk\n");
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup("node1"), Some("00:11:22:33:44:55"));
        assert_eq!(reg.lookup("node2"), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn skips_comments_blank_and_single_token_lines() {
        let reg = parse(
            "# node0 00:00:00:00:00:00\n\
             \n\
             lonely\n\
             #comment-without-space 11:11:11:11:11:11\n\
             node1 00:11:22:33:44:55\n",
        );
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["node1"]);
        assert_eq!(reg.lookup("lonely"), None);
        assert_eq!(reg.lookup("#"), None);
    }

    #[test]
    fn hash_later_in_line_is_not_a_comment() {
        let reg = parse("node1 00:11:22:33:44:55 # rack 4\n");
        assert_eq!(reg.lookup("node1"), Some("00:11:22:33:44:55"));
    }

    #[test]
    fn non_utf8_comment_does_not_abort_load() {
        let reg = Registry::parse(&b"# rack in Z\xFCrich\nnodeA 00:11:22:33:44:55\n"[..]).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.lookup("nodeA"), Some("00:11:22:33:44:55"));
    }

    #[test]
    fn non_utf8_node_name_is_kept_lossily() {
        let reg = Registry::parse(&b"n\xE9ud 00:11:22:33:44:55\nnodeB 00:11:22:33:44:66"[..]).unwrap();
        assert_eq!(reg.lookup("n\u{FFFD}ud"), Some("00:11:22:33:44:55"));
        assert_eq!(reg.lookup("nodeB"), Some("00:11:22:33:44:66"));
    }

    #[test]
    fn later_duplicate_wins() {
        let reg = parse("node1 00:00:00:00:00:01\nnode1 00:00:00:00:00:02\n");
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.lookup("node1"), Some("00:00:00:00:00:02"));
    }

    #[test]
    fn mac_is_not_validated() {
        let reg = parse("weird not-a-mac\n");
        assert_eq!(reg.lookup("weird"), Some("not-a-mac"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# etherwake.conf").unwrap();
        writeln!(file, "nodeA 00:11:22:33:44:55").unwrap();
        let reg = Registry::load(file.path()).unwrap();
        assert_eq!(reg.lookup("nodeA"), Some("00:11:22:33:44:55"));
    }

    #[test]
    fn load_missing_file_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.conf");
        match Registry::load(&path) {
            Err(Error::ConfigNotFound { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected ConfigNotFound, got {other:?}"),
        }
    }
}
