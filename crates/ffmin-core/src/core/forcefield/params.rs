use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Per-atom-type parameters of the Universal Force Field.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct UffAtomParams {
    /// Valence bond radius (Å).
    pub r1: f64,
    /// Natural valence angle (degrees).
    pub theta0: f64,
    /// Nonbonded distance (Å).
    pub x1: f64,
    /// Nonbonded well depth (kcal/mol).
    pub d1: f64,
    /// Nonbonded scale factor.
    pub zeta: f64,
    /// Effective charge.
    pub z1: f64,
    /// sp3 torsional barrier parameter (kcal/mol).
    pub v1: f64,
    /// sp2 torsional barrier parameter (kcal/mol).
    pub u1: f64,
    /// GMP electronegativity.
    pub xi: f64,
}

macro_rules! uff {
    ($r1:expr, $theta0:expr, $x1:expr, $d1:expr, $zeta:expr, $z1:expr, $v1:expr, $u1:expr, $xi:expr) => {
        UffAtomParams {
            r1: $r1,
            theta0: $theta0,
            x1: $x1,
            d1: $d1,
            zeta: $zeta,
            z1: $z1,
            v1: $v1,
            u1: $u1,
            xi: $xi,
        }
    };
}

static UFF_PARAMS: Map<&'static str, UffAtomParams> = phf_map! {
    "H_" => uff!(0.354, 180.0, 2.886, 0.044, 12.0, 0.712, 0.0, 0.0, 4.528),
    "B_3" => uff!(0.838, 109.47, 4.083, 0.180, 12.052, 1.755, 0.0, 0.0, 5.110),
    "B_2" => uff!(0.828, 120.0, 4.083, 0.180, 12.052, 1.755, 0.0, 0.0, 5.110),
    "C_3" => uff!(0.757, 109.47, 3.851, 0.105, 12.73, 1.912, 2.119, 2.0, 5.343),
    "C_R" => uff!(0.729, 120.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343),
    "C_2" => uff!(0.732, 120.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343),
    "C_1" => uff!(0.706, 180.0, 3.851, 0.105, 12.73, 1.912, 0.0, 2.0, 5.343),
    "N_3" => uff!(0.700, 106.7, 3.660, 0.069, 13.407, 2.544, 0.450, 2.0, 6.899),
    "N_R" => uff!(0.699, 120.0, 3.660, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899),
    "N_2" => uff!(0.685, 111.2, 3.660, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899),
    "N_1" => uff!(0.656, 180.0, 3.660, 0.069, 13.407, 2.544, 0.0, 2.0, 6.899),
    "O_3" => uff!(0.658, 104.51, 3.500, 0.060, 14.085, 2.300, 0.018, 2.0, 8.741),
    "O_R" => uff!(0.680, 110.0, 3.500, 0.060, 14.085, 2.300, 0.0, 2.0, 8.741),
    "O_2" => uff!(0.634, 120.0, 3.500, 0.060, 14.085, 2.300, 0.0, 2.0, 8.741),
    "O_1" => uff!(0.639, 180.0, 3.500, 0.060, 14.085, 2.300, 0.0, 2.0, 8.741),
    "F_" => uff!(0.668, 180.0, 3.364, 0.050, 14.762, 1.735, 0.0, 2.0, 10.874),
    "Si3" => uff!(1.117, 109.47, 4.295, 0.402, 12.175, 2.323, 1.225, 1.25, 4.168),
    "P_3+3" => uff!(1.101, 93.8, 4.147, 0.305, 13.072, 2.863, 2.4, 1.25, 5.463),
    "S_3+2" => uff!(1.064, 92.1, 4.035, 0.274, 13.969, 2.703, 0.484, 1.25, 6.928),
    "S_2" => uff!(0.854, 120.0, 4.035, 0.274, 13.969, 2.703, 0.484, 1.25, 6.928),
    "Cl" => uff!(1.044, 180.0, 3.947, 0.227, 14.866, 2.348, 0.0, 1.25, 8.564),
    "Br" => uff!(1.192, 180.0, 4.189, 0.251, 15.0, 2.519, 0.0, 0.7, 7.790),
    "I_" => uff!(1.382, 180.0, 4.500, 0.339, 15.0, 2.650, 0.0, 0.2, 6.822),
};

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
struct UffParamRecord {
    label: String,
    r1: f64,
    theta0: f64,
    x1: f64,
    d1: f64,
    zeta: f64,
    z1: f64,
    v1: f64,
    u1: f64,
    xi: f64,
}

impl From<&UffParamRecord> for UffAtomParams {
    fn from(r: &UffParamRecord) -> Self {
        uff!(r.r1, r.theta0, r.x1, r.d1, r.zeta, r.z1, r.v1, r.u1, r.xi)
    }
}

#[derive(Debug, Deserialize)]
struct UffParamFile {
    atom_types: HashMap<String, UffAtomParams>,
}

/// UFF parameters keyed by atom-type label, with optional user overrides layered
/// on top of the built-in table.
#[derive(Debug, Clone, Default)]
pub struct UffParameterTable {
    overrides: HashMap<String, UffAtomParams>,
}

impl UffParameterTable {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&UffAtomParams> {
        self.overrides.get(label).or_else(|| UFF_PARAMS.get(label))
    }

    pub fn insert(&mut self, label: &str, params: UffAtomParams) {
        self.overrides.insert(label.to_string(), params);
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Loads overrides from a `.csv` file (header `label,r1,theta0,x1,d1,zeta,z1,v1,u1,xi`)
    /// or, for any other extension, a TOML file with an `[atom_types.<label>]` table per type.
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::load_csv(path)
        } else {
            Self::load_toml(path)
        }
    }

    fn load_csv(path: &Path) -> Result<Self, ParamLoadError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| ParamLoadError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut overrides = HashMap::new();
        for result in reader.deserialize::<UffParamRecord>() {
            let record = result.map_err(|e| ParamLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            overrides.insert(record.label.clone(), UffAtomParams::from(&record));
        }
        Ok(Self { overrides })
    }

    fn load_toml(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: UffParamFile = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(Self {
            overrides: file.atom_types,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmffBondParams {
    pub kb: f64,
    pub r0: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmffAngleParams {
    pub ka: f64,
    pub theta0: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmffTorsionParams {
    pub v1: f64,
    pub v2: f64,
    pub v3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonorAcceptor {
    Neither,
    Donor,
    Acceptor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmffVdwParams {
    pub alpha: f64,
    pub n_eff: f64,
    pub a: f64,
    pub g: f64,
    pub da: DonorAcceptor,
}

static MMFF_BONDS: Map<&'static str, MmffBondParams> = phf_map! {
    "1-1" => MmffBondParams { kb: 4.258, r0: 1.508 },
    "1-5" => MmffBondParams { kb: 4.766, r0: 1.093 },
    "1-6" => MmffBondParams { kb: 5.047, r0: 1.418 },
    "1-8" => MmffBondParams { kb: 5.084, r0: 1.451 },
    "6-21" => MmffBondParams { kb: 7.762, r0: 0.972 },
    "8-23" => MmffBondParams { kb: 6.056, r0: 1.019 },
};

// Keyed outer-center-outer with the outer types in ascending order.
static MMFF_ANGLES: Map<&'static str, MmffAngleParams> = phf_map! {
    "1-1-1" => MmffAngleParams { ka: 0.851, theta0: 109.608 },
    "1-1-5" => MmffAngleParams { ka: 0.636, theta0: 110.549 },
    "5-1-5" => MmffAngleParams { ka: 0.516, theta0: 108.836 },
    "1-1-6" => MmffAngleParams { ka: 0.947, theta0: 108.133 },
    "5-1-6" => MmffAngleParams { ka: 0.829, theta0: 108.577 },
    "1-6-1" => MmffAngleParams { ka: 1.000, theta0: 106.5 },
    "1-6-21" => MmffAngleParams { ka: 0.772, theta0: 106.503 },
    "1-1-8" => MmffAngleParams { ka: 1.080, theta0: 109.5 },
    "5-1-8" => MmffAngleParams { ka: 0.855, theta0: 108.8 },
    "1-8-1" => MmffAngleParams { ka: 1.020, theta0: 108.3 },
    "1-8-23" => MmffAngleParams { ka: 0.618, theta0: 109.8 },
    "23-8-23" => MmffAngleParams { ka: 0.540, theta0: 106.4 },
};

// Canonical order: central pair ascending, then outer pair ascending. "0" is a wildcard.
static MMFF_TORSIONS: Map<&'static str, MmffTorsionParams> = phf_map! {
    "1-1-1-1" => MmffTorsionParams { v1: 0.103, v2: 0.681, v3: 0.332 },
    "1-1-1-5" => MmffTorsionParams { v1: 0.639, v2: -0.630, v3: 0.264 },
    "5-1-1-5" => MmffTorsionParams { v1: 0.284, v2: -1.386, v3: 0.314 },
    "1-1-1-6" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.300 },
    "5-1-1-6" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.300 },
    "1-1-6-1" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.400 },
    "5-1-6-1" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.400 },
    "1-1-6-21" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.200 },
    "5-1-6-21" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.180 },
    "1-1-1-8" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.300 },
    "5-1-1-8" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.300 },
    "1-1-8-1" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.300 },
    "5-1-8-1" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.300 },
    "1-1-8-23" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.250 },
    "5-1-8-23" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.250 },
    "0-1-1-0" => MmffTorsionParams { v1: 0.0, v2: 0.0, v3: 0.300 },
};

static MMFF_VDW: Map<u8, MmffVdwParams> = phf_map! {
    1u8 => MmffVdwParams { alpha: 1.050, n_eff: 2.490, a: 3.890, g: 1.282, da: DonorAcceptor::Neither },
    5u8 => MmffVdwParams { alpha: 0.250, n_eff: 0.800, a: 4.200, g: 1.209, da: DonorAcceptor::Neither },
    6u8 => MmffVdwParams { alpha: 0.700, n_eff: 3.150, a: 3.890, g: 1.282, da: DonorAcceptor::Acceptor },
    8u8 => MmffVdwParams { alpha: 1.150, n_eff: 2.820, a: 3.890, g: 1.282, da: DonorAcceptor::Acceptor },
    21u8 => MmffVdwParams { alpha: 0.150, n_eff: 0.800, a: 4.200, g: 1.209, da: DonorAcceptor::Donor },
    23u8 => MmffVdwParams { alpha: 0.150, n_eff: 0.800, a: 4.200, g: 1.209, da: DonorAcceptor::Donor },
};

// Bond charge increments for the lower type of each ascending pair.
static MMFF_BOND_CHARGE_INCREMENTS: Map<&'static str, f64> = phf_map! {
    "1-1" => 0.0,
    "1-5" => 0.0,
    "1-6" => 0.28,
    "1-8" => 0.27,
    "6-21" => -0.40,
    "8-23" => -0.36,
};

pub fn mmff_bond_params(t1: u8, t2: u8) -> Option<MmffBondParams> {
    let (lo, hi) = (t1.min(t2), t1.max(t2));
    MMFF_BONDS.get(format!("{lo}-{hi}").as_str()).copied()
}

pub fn mmff_angle_params(ti: u8, tj: u8, tk: u8) -> Option<MmffAngleParams> {
    let (lo, hi) = (ti.min(tk), ti.max(tk));
    MMFF_ANGLES.get(format!("{lo}-{tj}-{hi}").as_str()).copied()
}

/// Torsion parameters for `ti-tj-tk-tl`, falling back to the `0-tj-tk-0` wildcard.
pub fn mmff_torsion_params(ti: u8, tj: u8, tk: u8, tl: u8) -> Option<MmffTorsionParams> {
    let (a, b, c, d) = if tj > tk || (tj == tk && ti > tl) {
        (tl, tk, tj, ti)
    } else {
        (ti, tj, tk, tl)
    };
    MMFF_TORSIONS
        .get(format!("{a}-{b}-{c}-{d}").as_str())
        .or_else(|| MMFF_TORSIONS.get(format!("0-{b}-{c}-0").as_str()))
        .copied()
}

pub fn mmff_vdw_params(t: u8) -> Option<MmffVdwParams> {
    MMFF_VDW.get(&t).copied()
}

/// Charge increment received by the atom of type `t_self` from its bond to `t_other`.
pub fn mmff_bond_charge_increment(t_self: u8, t_other: u8) -> Option<f64> {
    let (lo, hi) = (t_self.min(t_other), t_self.max(t_other));
    let bci = MMFF_BOND_CHARGE_INCREMENTS
        .get(format!("{lo}-{hi}").as_str())
        .copied()?;
    Some(if t_self <= t_other { bci } else { -bci })
}
