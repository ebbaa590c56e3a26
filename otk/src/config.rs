//! Configuration.
use std::path::PathBuf;

/// Location of the quote store, relative to the user configuration directory.
const QUOTE_STORE_PATH: [&str; 2] = ["gramine", "otk-quotes"];

/// Global configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Path of the quote store file.
    pub quote_store: PathBuf,
    /// Signing-related configuration.
    pub signing: Signing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quote_store: default_quote_store(),
            signing: Signing::default(),
        }
    }
}

/// Signing-related configuration.
#[derive(Clone, Debug)]
pub struct Signing {
    /// Require ISVSVN to be at its maximum value (0xFFFF).
    pub check_isvsvn: bool,
    /// Log the modulus, MRSIGNER and quote produced during signing.
    pub show_quote: bool,
    /// Save the produced quote in the quote store.
    pub store_quote: bool,
}

impl Default for Signing {
    fn default() -> Self {
        Self {
            check_isvsvn: false,
            show_quote: false,
            store_quote: true,
        }
    }
}

/// Default path of the quote store.
///
/// This is `$XDG_CONFIG_HOME/gramine/otk-quotes`, which usually resolves to
/// `~/.config/gramine/otk-quotes`.
pub fn default_quote_store() -> PathBuf {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    QUOTE_STORE_PATH.iter().fold(base, |path, c| path.join(c))
}
