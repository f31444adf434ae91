//! Core data types for the MP3 Player bundler.

use serde::{Deserialize, Deserializer, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Separator PyInstaller expects between source and destination in `--add-data`.
#[cfg(windows)]
pub const DATA_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const DATA_SEPARATOR: &str = ":";

/// Bundle layout produced by the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BundleMode {
    /// A directory holding the executable and its dependencies.
    #[default]
    OneDir,
    /// A single self-extracting executable.
    OneFile,
}

impl BundleMode {
    pub fn as_flag(&self) -> &'static str {
        match self {
            BundleMode::OneDir => "--onedir",
            BundleMode::OneFile => "--onefile",
        }
    }
}

/// A directory copied verbatim into the bundle.
///
/// Deserializes from either a plain string (`"Image"`, destination equals
/// source) or a table (`{ source = "assets", dest = "Image" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataInclusion {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl DataInclusion {
    /// Include `dir` under the same name inside the bundle.
    pub fn same_name(dir: impl Into<PathBuf>) -> Self {
        let source = dir.into();
        DataInclusion {
            dest: source.clone(),
            source,
        }
    }

    /// Render as the value of one `--add-data` argument.
    pub fn to_arg(&self) -> OsString {
        let mut arg = OsString::from(self.source.as_os_str());
        arg.push(DATA_SEPARATOR);
        arg.push(self.dest.as_os_str());
        arg
    }
}

impl<'de> Deserialize<'de> for DataInclusion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, MapAccess, Visitor};

        struct DataInclusionVisitor;

        impl<'de> Visitor<'de> for DataInclusionVisitor {
            type Value = DataInclusion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a directory name or a table with source and dest")
            }

            fn visit_str<E>(self, value: &str) -> Result<DataInclusion, E>
            where
                E: de::Error,
            {
                Ok(DataInclusion::same_name(value))
            }

            fn visit_map<M>(self, mut map: M) -> Result<DataInclusion, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut source: Option<PathBuf> = None;
                let mut dest: Option<PathBuf> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "source" => source = Some(map.next_value()?),
                        "dest" => dest = Some(map.next_value()?),
                        other => return Err(de::Error::unknown_field(other, &["source", "dest"])),
                    }
                }
                let source = source.ok_or_else(|| de::Error::missing_field("source"))?;
                let dest = dest.unwrap_or_else(|| source.clone());
                Ok(DataInclusion { source, dest })
            }
        }

        deserializer.deserialize_any(DataInclusionVisitor)
    }
}

/// Packaging configuration.
///
/// Every default reproduces the fixed MP3 Player build: `venv`, `app.py`,
/// `MP3Player`, windowed one-dir mode, `Image` and `data` copied in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingConfig {
    /// Virtual environment directory
    pub venv_dir: PathBuf,
    /// Application entry point handed to the bundler
    pub entry_point: PathBuf,
    /// Output name (`dist/<app_name>/`, `<app_name>.spec`)
    pub app_name: String,
    /// Cache file provisioned with `{}` when missing
    pub cache_file: PathBuf,
    /// Suppress the console window
    pub windowed: bool,
    pub mode: BundleMode,
    /// Optional application icon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,
    /// Stale output directories removed before each run
    pub clean_dirs: Vec<PathBuf>,
    /// Bundler executable, resolved inside the environment first
    pub bundler: String,
    /// Directory for persisted run logs
    pub log_dir: PathBuf,
    /// Echo log lines to the console
    pub echo: bool,
    /// Directories copied verbatim into the bundle
    pub data: Vec<DataInclusion>,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        PackagingConfig {
            venv_dir: PathBuf::from("venv"),
            entry_point: PathBuf::from("app.py"),
            app_name: "MP3Player".to_string(),
            cache_file: PathBuf::from("data").join("library.json"),
            windowed: true,
            mode: BundleMode::OneDir,
            icon: None,
            clean_dirs: vec![PathBuf::from("build"), PathBuf::from("dist")],
            bundler: "pyinstaller".to_string(),
            log_dir: PathBuf::from("logs"),
            echo: true,
            data: vec![
                DataInclusion::same_name("Image"),
                DataInclusion::same_name("data"),
            ],
        }
    }
}

impl PackagingConfig {
    /// Name of the spec file the bundler generates next to the entry point.
    pub fn spec_file_name(&self) -> String {
        format!("{}.spec", self.app_name)
    }
}

/// Fully resolved bundler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleSpec {
    pub program: PathBuf,
    pub entry_point: PathBuf,
    pub name: String,
    pub mode: BundleMode,
    pub windowed: bool,
    pub icon: Option<PathBuf>,
    pub data: Vec<DataInclusion>,
}

impl BundleSpec {
    /// Build the invocation for `config`, running `program`.
    pub fn from_config(config: &PackagingConfig, program: PathBuf) -> Self {
        BundleSpec {
            program,
            entry_point: config.entry_point.clone(),
            name: config.app_name.clone(),
            mode: config.mode,
            windowed: config.windowed,
            icon: config.icon.clone(),
            data: config.data.clone(),
        }
    }

    /// Command-line arguments, excluding the program itself.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--noconfirm".into(),
            self.mode.as_flag().into(),
            "--name".into(),
            self.name.clone().into(),
        ];
        if self.windowed {
            args.push("--windowed".into());
        }
        if let Some(icon) = &self.icon {
            args.push("--icon".into());
            args.push(icon.clone().into_os_string());
        }
        for inclusion in &self.data {
            args.push("--add-data".into());
            args.push(inclusion.to_arg());
        }
        args.push(self.entry_point.clone().into_os_string());
        args
    }
}

/// Outcome of a successful packaging run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// Produced bundle directory
    pub output_dir: PathBuf,
    pub cache_file: PathBuf,
    /// Whether the cache file was created by this run
    pub cache_created: bool,
    /// Stale artifacts that existed and were removed
    pub removed: Vec<PathBuf>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_fixed_build() {
        let cfg = PackagingConfig::default();
        assert_eq!(cfg.venv_dir, PathBuf::from("venv"));
        assert_eq!(cfg.entry_point, PathBuf::from("app.py"));
        assert_eq!(cfg.app_name, "MP3Player");
        assert_eq!(cfg.cache_file, PathBuf::from("data/library.json"));
        assert_eq!(cfg.spec_file_name(), "MP3Player.spec");
        assert!(cfg.windowed);
        assert_eq!(cfg.mode, BundleMode::OneDir);
    }

    #[test]
    fn test_default_bundle_args() {
        let cfg = PackagingConfig::default();
        let spec = BundleSpec::from_config(&cfg, PathBuf::from("pyinstaller"));
        let args: Vec<String> = spec
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let image = format!("Image{}Image", DATA_SEPARATOR);
        let data = format!("data{}data", DATA_SEPARATOR);
        assert_eq!(
            args,
            vec![
                "--noconfirm",
                "--onedir",
                "--name",
                "MP3Player",
                "--windowed",
                "--add-data",
                image.as_str(),
                "--add-data",
                data.as_str(),
                "app.py",
            ]
        );
    }

    #[test]
    fn test_icon_is_passed_when_set() {
        let cfg = PackagingConfig {
            icon: Some(PathBuf::from("Image/mp3.png")),
            windowed: false,
            ..PackagingConfig::default()
        };
        let spec = BundleSpec::from_config(&cfg, PathBuf::from("pyinstaller"));
        let args = spec.args();
        let pos = args.iter().position(|a| a == "--icon").expect("icon flag");
        assert_eq!(args[pos + 1], OsString::from("Image/mp3.png"));
        assert!(!args.iter().any(|a| a == "--windowed"));
    }

    #[test]
    fn test_data_inclusion_deserializes_from_string_and_table() {
        #[derive(Deserialize)]
        struct Wrapper {
            data: Vec<DataInclusion>,
        }

        let parsed: Wrapper = toml::from_str(
            r#"data = ["Image", { source = "assets/icons", dest = "Image" }, { source = "data" }]"#,
        )
        .unwrap();

        assert_eq!(parsed.data[0], DataInclusion::same_name("Image"));
        assert_eq!(parsed.data[1].source, PathBuf::from("assets/icons"));
        assert_eq!(parsed.data[1].dest, PathBuf::from("Image"));
        assert_eq!(parsed.data[2], DataInclusion::same_name("data"));
    }

    #[test]
    fn test_bundle_mode_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: BundleMode,
        }
        let parsed: Wrapper = toml::from_str(r#"mode = "onefile""#).unwrap();
        assert_eq!(parsed.mode, BundleMode::OneFile);
        assert_eq!(parsed.mode.as_flag(), "--onefile");
    }
}
