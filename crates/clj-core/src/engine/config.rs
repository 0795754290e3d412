use crate::core::forcefield::cutoff::{CutoffConfig, CutoffError};
use crate::core::forcefield::params::CombiningRule;
use crate::core::forcefield::potentials::COULOMB_CONSTANT;
use crate::core::kernel::{CljKernel, Electrostatics};
use crate::core::space::{Space, SpaceError};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::grid::DEFAULT_GRID_CHUNK;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error(transparent)]
    Cutoff(#[from] CutoffError),
    #[error(transparent)]
    Space(#[from] SpaceError),
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

fn default_shift() -> bool {
    true
}

fn default_coulomb_constant() -> f64 {
    COULOMB_CONSTANT
}

fn default_grid_chunk() -> usize {
    DEFAULT_GRID_CHUNK
}

fn default_box_length() -> f64 {
    15.0
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CutoffSettings {
    pub coulomb: f64,
    pub lj: f64,
    /// Start of LJ switching; defaults to the LJ cutoff (no switching).
    pub feather: Option<f64>,
    #[serde(default = "default_shift")]
    pub shift: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum SpaceSettings {
    #[default]
    Vacuum,
    Periodic {
        dimensions: [f64; 3],
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ElectrostaticsSettings {
    #[default]
    Shifted,
    ReactionField {
        dielectric: f64,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParallelSettings {
    #[serde(rename = "grid-chunk-size", default = "default_grid_chunk")]
    pub grid_chunk_size: usize,
    #[serde(rename = "box-length", default = "default_box_length")]
    pub box_length: f64,
}

impl Default for ParallelSettings {
    fn default() -> Self {
        Self {
            grid_chunk_size: DEFAULT_GRID_CHUNK,
            box_length: default_box_length(),
        }
    }
}

/// Names of the per-molecule properties the kernel inputs are read from.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ParameterKeys {
    pub coordinates: String,
    pub charge: String,
    pub lj: String,
    pub intrascale: String,
}

impl Default for ParameterKeys {
    fn default() -> Self {
        Self {
            coordinates: "coordinates".to_string(),
            charge: "charge".to_string(),
            lj: "LJ".to_string(),
            intrascale: "intrascale".to_string(),
        }
    }
}

/// On-disk form of a kernel configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KernelSettings {
    pub cutoff: CutoffSettings,
    #[serde(rename = "combining-rule", default)]
    pub combining_rule: CombiningRule,
    #[serde(default)]
    pub space: SpaceSettings,
    #[serde(default)]
    pub electrostatics: ElectrostaticsSettings,
    #[serde(rename = "coulomb-constant", default = "default_coulomb_constant")]
    pub coulomb_constant: f64,
    #[serde(default)]
    pub parallel: ParallelSettings,
    #[serde(default)]
    pub keys: ParameterKeys,
}

impl KernelSettings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })
    }

    pub fn builder(&self) -> KernelConfigBuilder {
        let mut builder = KernelConfigBuilder::new()
            .coulomb_cutoff(self.cutoff.coulomb)
            .lj_cutoff(self.cutoff.lj)
            .shift_electrostatics(self.cutoff.shift)
            .combining_rule(self.combining_rule)
            .coulomb_constant(self.coulomb_constant);
        if let Some(feather) = self.cutoff.feather {
            builder = builder.feather(feather);
        }
        builder = match self.space {
            SpaceSettings::Vacuum => builder.vacuum(),
            SpaceSettings::Periodic { dimensions } => builder.periodic(dimensions),
        };
        match self.electrostatics {
            ElectrostaticsSettings::Shifted => builder.electrostatics(Electrostatics::Shifted),
            ElectrostaticsSettings::ReactionField { dielectric } => {
                builder.electrostatics(Electrostatics::ReactionField { dielectric })
            }
        }
    }

    pub fn to_kernel(&self) -> Result<CljKernel, ConfigError> {
        if self.parallel.grid_chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "grid-chunk-size",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.parallel.box_length.is_finite() && self.parallel.box_length > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "box-length",
                reason: format!("must be positive, got {}", self.parallel.box_length),
            });
        }
        self.builder().build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SpaceChoice {
    Vacuum,
    Periodic([f64; 3]),
}

#[derive(Default)]
pub struct KernelConfigBuilder {
    coulomb_cutoff: Option<f64>,
    lj_cutoff: Option<f64>,
    feather: Option<f64>,
    shift_electrostatics: Option<bool>,
    combining_rule: Option<CombiningRule>,
    space: Option<SpaceChoice>,
    electrostatics: Option<Electrostatics>,
    coulomb_constant: Option<f64>,
}

impl KernelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coulomb_cutoff(mut self, cutoff: f64) -> Self {
        self.coulomb_cutoff = Some(cutoff);
        self
    }
    pub fn lj_cutoff(mut self, cutoff: f64) -> Self {
        self.lj_cutoff = Some(cutoff);
        self
    }
    pub fn cutoff(self, cutoff: f64) -> Self {
        self.coulomb_cutoff(cutoff).lj_cutoff(cutoff)
    }
    pub fn feather(mut self, feather: f64) -> Self {
        self.feather = Some(feather);
        self
    }
    pub fn shift_electrostatics(mut self, shift: bool) -> Self {
        self.shift_electrostatics = Some(shift);
        self
    }
    pub fn combining_rule(mut self, rule: CombiningRule) -> Self {
        self.combining_rule = Some(rule);
        self
    }
    pub fn vacuum(mut self) -> Self {
        self.space = Some(SpaceChoice::Vacuum);
        self
    }
    pub fn periodic(mut self, dimensions: [f64; 3]) -> Self {
        self.space = Some(SpaceChoice::Periodic(dimensions));
        self
    }
    pub fn electrostatics(mut self, electrostatics: Electrostatics) -> Self {
        self.electrostatics = Some(electrostatics);
        self
    }
    pub fn coulomb_constant(mut self, k: f64) -> Self {
        self.coulomb_constant = Some(k);
        self
    }

    pub fn build(self) -> Result<CljKernel, ConfigError> {
        let coulomb_cutoff = self
            .coulomb_cutoff
            .ok_or(ConfigError::MissingParameter("coulomb_cutoff"))?;
        let lj_cutoff = self
            .lj_cutoff
            .ok_or(ConfigError::MissingParameter("lj_cutoff"))?;
        let feather = self.feather.unwrap_or(lj_cutoff);
        let cutoffs = CutoffConfig::new(
            coulomb_cutoff,
            lj_cutoff,
            feather,
            self.shift_electrostatics.unwrap_or(true),
        )?;

        let space = match self.space.unwrap_or(SpaceChoice::Vacuum) {
            SpaceChoice::Vacuum => Space::Vacuum,
            SpaceChoice::Periodic(dimensions) => Space::periodic(dimensions)?,
        };
        if let Space::Periodic(cell) = &space {
            let shortest = cell.dimensions().min();
            if cutoffs.max_cutoff() > 0.5 * shortest {
                return Err(ConfigError::InvalidValue {
                    name: "cutoff",
                    reason: format!(
                        "{} exceeds half the shortest box edge ({shortest})",
                        cutoffs.max_cutoff()
                    ),
                });
            }
        }

        let electrostatics = self.electrostatics.unwrap_or_default();
        if let Electrostatics::ReactionField { dielectric } = electrostatics {
            if !(dielectric.is_finite() && dielectric >= 1.0) {
                return Err(ConfigError::InvalidValue {
                    name: "dielectric",
                    reason: format!("must be at least 1, got {dielectric}"),
                });
            }
        }

        let coulomb_constant = self.coulomb_constant.unwrap_or(COULOMB_CONSTANT);
        if !(coulomb_constant.is_finite() && coulomb_constant > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "coulomb-constant",
                reason: format!("must be positive, got {coulomb_constant}"),
            });
        }

        Ok(CljKernel::new(
            cutoffs,
            self.combining_rule.unwrap_or_default(),
            space,
        )
        .with_electrostatics(electrostatics)
        .with_coulomb_constant(coulomb_constant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn build_fails_without_cutoffs() {
        let result = KernelConfigBuilder::new().lj_cutoff(10.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingParameter("coulomb_cutoff"))
        ));
        let result = KernelConfigBuilder::new().coulomb_cutoff(10.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingParameter("lj_cutoff"))
        ));
    }

    #[test]
    fn build_applies_documented_defaults() {
        let kernel = KernelConfigBuilder::new().cutoff(12.0).build().unwrap();
        assert_eq!(kernel.rule(), CombiningRule::Arithmetic);
        assert_eq!(*kernel.space(), Space::Vacuum);
        assert_eq!(kernel.electrostatics(), Electrostatics::Shifted);
        assert_eq!(kernel.coulomb_constant(), COULOMB_CONSTANT);
        assert!(!kernel.cutoffs().switching_active());
        assert!(kernel.cutoffs().shift_electrostatics());
    }

    #[test]
    fn build_reports_feather_beyond_cutoff() {
        let result = KernelConfigBuilder::new()
            .cutoff(10.0)
            .feather(11.0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::Cutoff(CutoffError::FeatherBeyondCutoff { .. }))
        ));
    }

    #[test]
    fn build_accepts_feather_beyond_a_shorter_coulomb_cutoff() {
        let kernel = KernelConfigBuilder::new()
            .coulomb_cutoff(8.0)
            .lj_cutoff(12.0)
            .feather(10.0)
            .build()
            .unwrap();
        assert!(kernel.cutoffs().switching_active());

        let unswitched = KernelConfigBuilder::new()
            .coulomb_cutoff(8.0)
            .lj_cutoff(12.0)
            .build()
            .unwrap();
        assert_eq!(unswitched.cutoffs().feather(), 12.0);
        assert!(!unswitched.cutoffs().switching_active());
    }

    #[test]
    fn build_rejects_cutoff_longer_than_half_the_box() {
        let result = KernelConfigBuilder::new()
            .cutoff(12.0)
            .periodic([20.0, 30.0, 30.0])
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "cutoff", .. })
        ));
    }

    #[test]
    fn build_rejects_dielectric_below_one() {
        let result = KernelConfigBuilder::new()
            .cutoff(10.0)
            .electrostatics(Electrostatics::ReactionField { dielectric: 0.5 })
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "dielectric", .. })
        ));
    }

    #[test]
    fn settings_parse_full_document() {
        let settings = KernelSettings::from_toml_str(
            r#"
            combining-rule = "geometric"
            coulomb-constant = 332.0

            [cutoff]
            coulomb = 12.0
            lj = 10.0
            feather = 8.5
            shift = false

            [space]
            type = "periodic"
            dimensions = [30.0, 30.0, 40.0]

            [electrostatics]
            type = "reaction-field"
            dielectric = 78.3

            [parallel]
            grid-chunk-size = 1024
            box-length = 12.5
            "#,
        )
        .unwrap();

        assert_eq!(settings.combining_rule, CombiningRule::Geometric);
        assert_eq!(settings.cutoff.feather, Some(8.5));
        assert_eq!(
            settings.space,
            SpaceSettings::Periodic {
                dimensions: [30.0, 30.0, 40.0]
            }
        );
        assert_eq!(settings.parallel.grid_chunk_size, 1024);
        assert_eq!(settings.keys, ParameterKeys::default());

        let kernel = settings.to_kernel().unwrap();
        assert!(kernel.space().is_periodic());
        assert!(kernel.cutoffs().switching_active());
        assert!(!kernel.cutoffs().shift_electrostatics());
        assert_eq!(
            kernel.electrostatics(),
            Electrostatics::ReactionField { dielectric: 78.3 }
        );
    }

    #[test]
    fn settings_fill_defaults_for_optional_sections() {
        let settings = KernelSettings::from_toml_str(
            r#"
            [cutoff]
            coulomb = 15.0
            lj = 15.0
            "#,
        )
        .unwrap();
        assert_eq!(settings.space, SpaceSettings::Vacuum);
        assert_eq!(settings.electrostatics, ElectrostaticsSettings::Shifted);
        assert_eq!(settings.parallel, ParallelSettings::default());
        assert!(settings.cutoff.shift);
        assert_eq!(settings.coulomb_constant, COULOMB_CONSTANT);
    }

    #[test]
    fn settings_reject_unknown_fields() {
        let result = KernelSettings::from_toml_str(
            r#"
            [cutoff]
            coulomb = 15.0
            lj = 15.0
            cutof = 3.0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn settings_reject_zero_grid_chunk() {
        let settings = KernelSettings::from_toml_str(
            r#"
            [cutoff]
            coulomb = 10.0
            lj = 10.0

            [parallel]
            grid-chunk-size = 0
            "#,
        )
        .unwrap();
        assert!(matches!(
            settings.to_kernel(),
            Err(ConfigError::InvalidValue {
                name: "grid-chunk-size",
                ..
            })
        ));
    }

    #[test]
    fn parameter_keys_can_be_renamed() {
        let settings = KernelSettings::from_toml_str(
            r#"
            [cutoff]
            coulomb = 10.0
            lj = 10.0

            [keys]
            charge = "partial-charge"
            "#,
        )
        .unwrap();
        assert_eq!(settings.keys.charge, "partial-charge");
        assert_eq!(settings.keys.lj, "LJ");
    }

    #[test]
    fn from_file_reads_settings_from_disk() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("kernel.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            r#"
            combining-rule = "arithmetic"

            [cutoff]
            coulomb = 9.0
            lj = 9.0
            "#
        )
        .unwrap();

        let settings = KernelSettings::from_file(&file_path).unwrap();
        assert_eq!(settings.cutoff.coulomb, 9.0);
        assert!(settings.to_kernel().is_ok());
    }

    #[test]
    fn from_file_reports_missing_file() {
        let dir = tempdir().unwrap();
        let result = KernelSettings::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
