//! # Platform-specific utilities
//!
//! Centralizes detection of the external command-line tools the converter
//! depends on (`cwebp` for encoding, `sips`/ImageMagick for resizing).

use std::collections::HashMap;
use std::sync::OnceLock;

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let (commands, which_command) = if cfg!(windows) {
            let mut commands = HashMap::new();
            commands.insert("cwebp", "cwebp.exe");
            commands.insert("magick", "magick.exe");
            commands.insert("convert", "convert.exe");
            // sips is macOS-only; leave it unmapped so detection fails fast
            (commands, "where")
        } else {
            let mut commands = HashMap::new();
            commands.insert("cwebp", "cwebp");
            commands.insert("sips", "sips");
            commands.insert("magick", "magick");
            commands.insert("convert", "convert");
            (commands, "which")
        };

        Self {
            commands,
            which_command,
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).unwrap_or(&base_name)
    }

    /// Check if a command is available on the system PATH
    pub async fn is_command_available(&self, base_name: &str) -> bool {
        let command_name = self.get_command(base_name);

        let result = tokio::process::Command::new(self.which_command)
            .arg(command_name)
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}
