//! nfs:// URL parser.
//!
//! Format (RFC 2224): `[nfs://]host[:port][,host[:port]...][/path]`
//!
//! IPv6 hosts are written in brackets, `nfs://[::1]:2049/export`.

use std::fmt;
use std::str::FromStr;

use nfstest_common::config::NFS_PORT;

use crate::error::{CheckError, CheckResult};

/// URL scheme of NFS servers.
pub const NFS_URL_SCHEME: &str = "nfs://";

/// One server address of a (possibly multipath) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parsed nfs:// URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfsUrl {
    pub servers: Vec<ServerAddr>,
    /// Path on the server, empty when the URL has none.
    pub path: String,
}

impl NfsUrl {
    pub fn parse(s: &str) -> CheckResult<Self> {
        let rest = s.strip_prefix(NFS_URL_SCHEME).unwrap_or(s);

        let (servers, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        if servers.is_empty() {
            return Err(CheckError::InvalidUrl(s.to_owned()));
        }

        let servers = servers
            .split(',')
            .map(|server| parse_server(server.trim(), s))
            .collect::<CheckResult<Vec<_>>>()?;

        Ok(Self {
            servers,
            path: path.to_owned(),
        })
    }

    // First server of the list
    pub fn primary(&self) -> Option<&ServerAddr> {
        self.servers.first()
    }
}

impl fmt::Display for NfsUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", NFS_URL_SCHEME)?;
        for (i, server) in self.servers.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", server)?;
        }
        write!(f, "{}", self.path)
    }
}

impl FromStr for NfsUrl {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_server(server: &str, url: &str) -> CheckResult<ServerAddr> {
    // a colon inside brackets belongs to an IPv6 address, not to the port
    let colon = server.rfind(':');
    let bracket = server.rfind(']');
    let colon = match (colon, bracket) {
        (Some(c), Some(b)) if b > c => None,
        (c, _) => c,
    };

    let (host, port) = match colon {
        Some(idx) => (&server[..idx], &server[idx + 1..]),
        None => (server, ""),
    };
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(CheckError::InvalidUrl(url.to_owned()));
    }

    let port = if port.is_empty() {
        NFS_PORT
    } else {
        port.parse()
            .map_err(|_| CheckError::InvalidUrl(format!("invalid port '{}' in {}", port, url)))?
    };

    Ok(ServerAddr {
        host: host.to_owned(),
        port,
    })
}

/// Parse `[nfs://]host:port/path`, returns the servers and the path.
pub fn parse_nfs_url(url: &str) -> CheckResult<(Vec<ServerAddr>, String)> {
    let url = NfsUrl::parse(url)?;
    Ok((url.servers, url.path))
}

/// Split `/a/b/c` into `["a", "b", "c"]`.
///
/// With `use_dots`, `.` components are dropped and `..` removes the previous
/// component. A `..` with nothing left to remove is ignored.
pub fn path_components(path: &str, use_dots: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for component in path.split('/') {
        match component {
            "" => {}
            "." if use_dots => {}
            ".." if use_dots => {
                out.pop();
            }
            c => out.push(c.to_owned()),
        }
    }
    out
}

/// Join path components back into an absolute path.
pub fn make_path<S: AsRef<str>>(components: &[S]) -> String {
    let mut path = String::new();
    for component in components {
        path.push('/');
        path.push_str(component.as_ref());
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}
