use crate::builtin;
use crate::error::FetchError;
use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;

/// Reads shader text from a resolved location.
///
/// The registry owns naming and caching; a fetcher only knows how to turn a
/// location string into text.
pub trait SourceFetcher {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<String, FetchError>>;
}

/// Join a base origin and a relative name with exactly one separator.
pub fn join_location(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return name.to_string();
    }
    format!("{base}/{name}")
}

fn decode_text(location: &str, bytes: Vec<u8>) -> Result<String, FetchError> {
    String::from_utf8(bytes).map_err(|_| FetchError::NotText {
        location: location.to_string(),
    })
}

/// Reads locations as paths on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetcher;

impl SourceFetcher for FsFetcher {
    async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        let bytes = std::fs::read(location).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound {
                location: location.to_string(),
            },
            _ => FetchError::Io {
                location: location.to_string(),
                message: e.to_string(),
            },
        })?;
        decode_text(location, bytes)
    }
}

/// In-memory table of location -> text.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    sources: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the sources compiled into this crate under `base`.
    pub fn builtin(base: &str) -> Self {
        let mut fetcher = Self::new();
        for (name, text) in builtin::SOURCES {
            fetcher.insert(join_location(base, name), *text);
        }
        fetcher
    }

    pub fn insert(&mut self, location: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(location.into(), text.into());
    }

    pub fn with(mut self, location: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(location, text);
        self
    }
}

impl SourceFetcher for MemoryFetcher {
    async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        self.sources
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                location: location.to_string(),
            })
    }
}

/// Plain `GET` against an http(s) origin.
///
/// Uses the blocking client, so the future completes on first poll. Do not
/// drive it from inside a tokio runtime.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(std::time::Duration::from_secs(15))
            .user_agent(concat!("rainglass/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        let io = |e: reqwest::Error| FetchError::Io {
            location: location.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(location).send().map_err(io)?;
        match response.status() {
            reqwest::StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound {
                    location: location.to_string(),
                });
            }
            status if !status.is_success() => {
                return Err(FetchError::Status {
                    location: location.to_string(),
                    status: status.as_u16(),
                });
            }
            _ => {}
        }
        let body = response.bytes().map_err(io)?;
        decode_text(location, body.to_vec())
    }
}

/// Fetcher chosen at runtime from the shape of the shader origin.
#[derive(Debug, Clone)]
pub enum AnyFetcher {
    Fs(FsFetcher),
    Memory(MemoryFetcher),
    #[cfg(feature = "http")]
    Http(HttpFetcher),
}

impl AnyFetcher {
    /// `http://` and `https://` bases go over the network, anything else is a
    /// filesystem path.
    pub fn for_base(base: &str) -> Result<Self, FetchError> {
        if !is_remote(base) {
            return Ok(AnyFetcher::Fs(FsFetcher));
        }
        #[cfg(feature = "http")]
        {
            HttpFetcher::new()
                .map(AnyFetcher::Http)
                .map_err(|e| FetchError::Io {
                    location: base.to_string(),
                    message: e.to_string(),
                })
        }
        #[cfg(not(feature = "http"))]
        {
            Err(FetchError::Unsupported {
                location: base.to_string(),
            })
        }
    }

    /// Serve the compiled-in sources under `base`.
    pub fn builtin(base: &str) -> Self {
        AnyFetcher::Memory(MemoryFetcher::builtin(base))
    }
}

impl SourceFetcher for AnyFetcher {
    async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        match self {
            AnyFetcher::Fs(f) => f.fetch(location).await,
            AnyFetcher::Memory(f) => f.fetch(location).await,
            #[cfg(feature = "http")]
            AnyFetcher::Http(f) => f.fetch(location).await,
        }
    }
}

fn is_remote(base: &str) -> bool {
    base.starts_with("http://") || base.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_location_uses_one_separator() {
        assert_eq!(join_location("./data/shaders/", "basic.vs"), "./data/shaders/basic.vs");
        assert_eq!(join_location("./data/shaders", "basic.vs"), "./data/shaders/basic.vs");
        assert_eq!(join_location("", "basic.vs"), "basic.vs");
        assert_eq!(
            join_location("https://cdn.example.org/glsl//", "flat.fs"),
            "https://cdn.example.org/glsl/flat.fs"
        );
    }

    #[test]
    fn fs_fetcher_reads_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basic.vs");
        std::fs::write(&path, "void main() {}").unwrap();

        let text = pollster::block_on(FsFetcher.fetch(path.to_str().unwrap())).unwrap();
        assert_eq!(text, "void main() {}");
    }

    #[test]
    fn fs_fetcher_classifies_failures() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.fs");
        let err = pollster::block_on(FsFetcher.fetch(missing.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));

        let binary = dir.path().join("blob.fs");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let err = pollster::block_on(FsFetcher.fetch(binary.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, FetchError::NotText { .. }));
        assert_eq!(err.location(), binary.to_str().unwrap());
    }

    #[test]
    fn memory_fetcher_builtin_serves_shipped_sources() {
        let fetcher = MemoryFetcher::builtin("./data/shaders/");
        let vs = pollster::block_on(fetcher.fetch("./data/shaders/basic.vs")).unwrap();
        assert!(vs.contains("void main()"));
        assert!(pollster::block_on(fetcher.fetch("./data/shaders/other.vs")).is_err());
    }

    #[test]
    fn any_fetcher_picks_by_origin() {
        assert!(matches!(
            AnyFetcher::for_base("./data/shaders/").unwrap(),
            AnyFetcher::Fs(_)
        ));
        #[cfg(not(feature = "http"))]
        assert!(matches!(
            AnyFetcher::for_base("https://cdn.example.org/glsl/"),
            Err(FetchError::Unsupported { .. })
        ));

        let builtin = AnyFetcher::builtin("shaders");
        let fs = pollster::block_on(builtin.fetch("shaders/flat.fs")).unwrap();
        assert!(fs.contains("u_ior"));
    }

    /// Serves `/glsl/basic.vs`, a 500 at `/glsl/broken.fs`, non-UTF-8 bytes at
    /// `/glsl/blob.fs` and a 404 for anything else, one request per connection.
    #[cfg(feature = "http")]
    fn serve_http(listener: std::net::TcpListener, requests: usize) {
        use std::io::{BufRead, BufReader, Write};

        for stream in listener.incoming().take(requests) {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(&stream);
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            let mut header = String::new();
            while reader.read_line(&mut header).is_ok_and(|n| n > 0) && header != "\r\n" {
                header.clear();
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("");
            let (status, body): (&str, &[u8]) = match path {
                "/glsl/basic.vs" => ("200 OK", &b"void main() {}\n"[..]),
                "/glsl/broken.fs" => ("500 Internal Server Error", &b"oops"[..]),
                "/glsl/blob.fs" => ("200 OK", &[0xff, 0xfe, 0x00, 0x80][..]),
                _ => ("404 Not Found", &b""[..]),
            };
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_fetcher_maps_status_and_body() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || serve_http(listener, 5));

        let fetcher = HttpFetcher::new().unwrap();
        let fetch = |path: &str| pollster::block_on(fetcher.fetch(&format!("http://{addr}{path}")));

        assert_eq!(fetch("/glsl/basic.vs").unwrap(), "void main() {}\n");

        let missing = fetch("/glsl/missing.fs").unwrap_err();
        assert!(matches!(missing, FetchError::NotFound { .. }));
        assert_eq!(missing.location(), format!("http://{addr}/glsl/missing.fs"));

        assert!(matches!(
            fetch("/glsl/broken.fs"),
            Err(FetchError::Status { status: 500, .. })
        ));
        assert!(matches!(
            fetch("/glsl/blob.fs"),
            Err(FetchError::NotText { .. })
        ));

        // The registry resolves names against an http base the same way.
        let registry = crate::ShaderRegistry::new(
            format!("http://{addr}/glsl/"),
            AnyFetcher::for_base(&format!("http://{addr}/glsl/")).unwrap(),
        );
        pollster::block_on(registry.load_from_file("basic.vs")).unwrap();
        assert_eq!(&*registry.get("basic.vs").unwrap(), "void main() {}\n");

        server.join().unwrap();
    }
}
