use super::{Notifier, NotifyError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Plex server address and access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlexConfig {
    pub url: String,
    pub token: String,
}

/// A library section and the folders it covers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    pub locations: Vec<PathBuf>,
}

/// Asks a Plex server to rescan sections that cover the destination
pub struct PlexNotifier {
    client: Client,
    config: PlexConfig,
}

impl PlexNotifier {
    pub fn new(config: PlexConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(format!("medialink/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    fn get(&self, path: &str) -> Result<String, NotifyError> {
        let url = format!(
            "{}{}?X-Plex-Token={}",
            self.config.url.trim_end_matches('/'),
            path,
            urlencoding::encode(&self.config.token)
        );
        debug!("Plex request: {}{}", self.config.url, path);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        Ok(response.text()?)
    }

    pub fn sections(&self) -> Result<Vec<LibrarySection>, NotifyError> {
        let xml = self.get("/library/sections")?;
        parse_sections(&xml)
    }
}

impl Notifier for PlexNotifier {
    fn refresh(&self, dest_root: &Path) -> Result<usize, NotifyError> {
        let sections = self.sections()?;

        refresh_sections(&sections, dest_root, |section| {
            self.get(&format!("/library/sections/{}/refresh", section.key))
                .map(|_| ())
        })
    }
}

/// Send `request` for every section covering a top-level folder of `dest_root`
///
/// A failed request is logged and the rest still go out. Returns the number
/// of requests that succeeded.
pub fn refresh_sections<F>(
    sections: &[LibrarySection],
    dest_root: &Path,
    mut request: F,
) -> Result<usize, NotifyError>
where
    F: FnMut(&LibrarySection) -> Result<(), NotifyError>,
{
    let mut refreshed = 0;

    for entry in fs::read_dir(dest_root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        for section in sections.iter().filter(|s| s.locations.contains(&path)) {
            match request(section) {
                Ok(()) => {
                    info!(section = %section.title, path = ?path, "Requested Plex refresh");
                    refreshed += 1;
                }
                Err(e) => warn!(section = %section.title, error = %e, "Plex refresh failed"),
            }
        }
    }

    Ok(refreshed)
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn section_from(e: &BytesStart<'_>) -> LibrarySection {
    LibrarySection {
        key: attribute(e, b"key").unwrap_or_default(),
        title: attribute(e, b"title").unwrap_or_default(),
        locations: Vec::new(),
    }
}

/// Parse the `/library/sections` listing
pub fn parse_sections(xml: &str) -> Result<Vec<LibrarySection>, NotifyError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut sections = Vec::new();
    let mut current: Option<LibrarySection> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"Directory" => current = Some(section_from(e)),
                b"Location" => {
                    if let (Some(section), Some(path)) = (current.as_mut(), attribute(e, b"path")) {
                        section.locations.push(PathBuf::from(path));
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"Directory" => sections.push(section_from(e)),
                b"Location" => {
                    if let (Some(section), Some(path)) = (current.as_mut(), attribute(e, b"path")) {
                        section.locations.push(PathBuf::from(path));
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"Directory" {
                    if let Some(section) = current.take() {
                        sections.push(section);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(NotifyError::ParseError(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECTIONS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="3" allowSync="0" title1="Plex Library">
  <Directory allowSync="1" key="1" type="movie" title="Movies" agent="tv.plex.agents.movie">
    <Location id="1" path="/library/movies" />
  </Directory>
  <Directory allowSync="1" key="2" type="show" title="TV Shows">
    <Location id="2" path="/library/shows" />
    <Location id="3" path="/library/anime_shows" />
  </Directory>
  <Directory key="7" type="artist" title="Music" />
</MediaContainer>"#;

    #[test]
    fn test_parse_sections() {
        let sections = parse_sections(SECTIONS_XML).unwrap();

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].key, "1");
        assert_eq!(sections[0].title, "Movies");
        assert_eq!(sections[0].locations, vec![PathBuf::from("/library/movies")]);
        assert_eq!(
            sections[1].locations,
            vec![
                PathBuf::from("/library/shows"),
                PathBuf::from("/library/anime_shows")
            ]
        );
        assert_eq!(sections[2].title, "Music");
        assert!(sections[2].locations.is_empty());
    }

    #[test]
    fn test_parse_empty_container() {
        let sections = parse_sections(r#"<MediaContainer size="0"></MediaContainer>"#).unwrap();
        assert!(sections.is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        let result = parse_sections("<MediaContainer><Directory key=\"1\"></Location>");
        assert!(matches!(result, Err(NotifyError::ParseError(_))));
    }

    fn section(key: &str, location: &Path) -> LibrarySection {
        LibrarySection {
            key: key.to_string(),
            title: format!("Section {}", key),
            locations: vec![location.to_path_buf()],
        }
    }

    #[test]
    fn test_refresh_continues_past_failures() {
        let dest = tempdir().unwrap();
        let movies = dest.path().join("movies");
        let shows = dest.path().join("shows");
        fs::create_dir_all(&movies).unwrap();
        fs::create_dir_all(&shows).unwrap();
        fs::write(dest.path().join("stray.txt"), "x").unwrap();

        let sections = vec![
            section("1", &movies),
            section("2", &shows),
            section("3", Path::new("/elsewhere")),
        ];

        let mut requested = Vec::new();
        let count = refresh_sections(&sections, dest.path(), |s| {
            requested.push(s.key.clone());
            if s.key == "1" {
                Err(NotifyError::Status(500))
            } else {
                Ok(())
            }
        })
        .unwrap();

        requested.sort();
        assert_eq!(requested, vec!["1", "2"]);
        assert_eq!(count, 1);
    }
}
