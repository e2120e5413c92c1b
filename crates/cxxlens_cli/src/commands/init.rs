//! Init command implementation

use std::path::PathBuf;

use cxxlens_core::AnalyzerConfig;
use miette::{IntoDiagnostic, Result};
use tracing::info;

/// Starting point with the usual invocation of each tool. Only cppcheck is enabled.
const DEFAULT_CONFIG: &str = r#"{
  "modifiedLinesOnly": false,
  "profile": "cxxlens-profile.json",
  "include": [],
  "exclude": ["**/third_party/**"],
  "tools": {
    "cppcheck": {
      "executable": "cppcheck",
      "arguments": "--inline-suppr --enable=all --xml -D__cplusplus -DNT",
      "stream": "stdout"
    },
    "rats": {
      "executable": "rats",
      "arguments": "--xml",
      "enabled": false
    },
    "vera": {
      "executable": "vera++",
      "arguments": "-nodup -showrules",
      "environment": { "VERA_ROOT": "/usr/lib/vera++" },
      "enabled": false
    },
    "pclint": {
      "executable": "lint-nt",
      "enabled": false
    },
    "custom": {
      "executable": "python",
      "arguments": "cpplint.py --output=vs7",
      "key": "cpplint",
      "enabled": false
    }
  }
}
"#;

pub fn run_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(AnalyzerConfig::CONFIG_FILES[0]);

    loop {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOFOLLOW);
        }

        match options.open(&config_path) {
            Ok(mut file) => {
                use std::io::Write;
                file.write_all(DEFAULT_CONFIG.as_bytes()).into_diagnostic()?;
                info!("Created {}", config_path.display());
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if !force {
                    return Err(miette::miette!(
                        "Config file already exists. Use --force to overwrite."
                    ));
                }

                match std::fs::remove_file(&config_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_diagnostic(),
                }
            }
            Err(e) => return Err(e).into_diagnostic(),
        }
    }
}
