//! Extension pour configurer le résolveur depuis tchconfig

use crate::ytdlp::{YtDlpResolver, DEFAULT_BINARY, DEFAULT_FORMAT};
use std::path::Path;
use tchconfig::Config;

pub trait ResolverConfigExt {
    /// Exécutable yt-dlp à utiliser
    fn get_ytdlp_binary(&self) -> String;

    /// Sélecteur de format audio
    fn get_ytdlp_format(&self) -> String;

    /// Construit le résolveur yt-dlp téléchargeant dans `download_dir`
    fn create_ytdlp_resolver(&self, download_dir: &Path) -> YtDlpResolver;
}

impl ResolverConfigExt for Config {
    fn get_ytdlp_binary(&self) -> String {
        self.get_string_or(&["resolver", "ytdlp_binary"], DEFAULT_BINARY)
    }

    fn get_ytdlp_format(&self) -> String {
        self.get_string_or(&["resolver", "audio_format"], DEFAULT_FORMAT)
    }

    fn create_ytdlp_resolver(&self, download_dir: &Path) -> YtDlpResolver {
        YtDlpResolver::new(download_dir)
            .with_binary(self.get_ytdlp_binary())
            .with_format(self.get_ytdlp_format())
    }
}
