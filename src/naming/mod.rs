mod name_builder;

pub use name_builder::{
    episode_stem, file_name, multi_episode_stem, raw_fallback_stem, sanitize_component,
    shorten_file_name, with_resolution, EpisodeStyle, SHORT_STEM_BYTES,
};

use crate::resolver::ResolvedIdentity;
use std::path::{Path, PathBuf};

/// `{dest}/{kind}/{folder}/Season NN`
pub fn episode_dir(dest: &Path, identity: &ResolvedIdentity, season: u32) -> PathBuf {
    dest.join(identity.media_kind.dir_name())
        .join(sanitize_component(&identity.folder_name()))
        .join(format!("Season {:02}", season))
}

/// `{dest}/movies/{folder}`
pub fn movie_dir(dest: &Path, identity: &ResolvedIdentity) -> PathBuf {
    dest.join(identity.media_kind.dir_name())
        .join(sanitize_component(&identity.folder_name()))
}

fn numbered(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(pos) if pos > 0 => format!("{} ({}){}", &name[..pos], n, &name[pos..]),
        _ => format!("{} ({})", name, n),
    }
}

/// `name`, then `name (1).ext`, `name (2).ext`, ...
pub fn name_candidates(name: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(name.to_string()).chain((1..).map(move |n| numbered(name, n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ExternalId;
    use crate::resolver::MediaKind;

    fn identity(kind: MediaKind) -> ResolvedIdentity {
        ResolvedIdentity {
            display_name: "Show Name".to_string(),
            external_id: Some(ExternalId::Imdb("tt42".to_string())),
            year: Some(2020),
            media_kind: kind,
        }
    }

    #[test]
    fn test_episode_dir() {
        let dir = episode_dir(Path::new("/dest"), &identity(MediaKind::Show), 1);
        assert_eq!(
            dir,
            PathBuf::from("/dest/shows/Show Name (2020) {imdb-tt42}/Season 01")
        );
    }

    #[test]
    fn test_anime_dir() {
        let dir = episode_dir(Path::new("/dest"), &identity(MediaKind::AnimeShow), 0);
        assert_eq!(
            dir,
            PathBuf::from("/dest/anime_shows/Show Name (2020) {imdb-tt42}/Season 00")
        );
    }

    #[test]
    fn test_movie_dir() {
        let dir = movie_dir(Path::new("/dest"), &identity(MediaKind::Movie));
        assert_eq!(dir, PathBuf::from("/dest/movies/Show Name (2020) {imdb-tt42}"));
    }

    #[test]
    fn test_numbered() {
        assert_eq!(numbered("Movie.mkv", 1), "Movie (1).mkv");
        assert_eq!(numbered("Folder", 2), "Folder (2)");
    }

    #[test]
    fn test_name_candidates() {
        let names: Vec<String> = name_candidates("Movie.mkv").take(3).collect();
        assert_eq!(names, vec!["Movie.mkv", "Movie (1).mkv", "Movie (2).mkv"]);
    }
}
