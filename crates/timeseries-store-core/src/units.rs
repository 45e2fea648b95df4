//! Domain units and dimension-checked conversion.
//!
//! Every unit a series can be declared in is a variant of [`DomainUnit`].
//! Each maps to a [`PhysicalUnit`]: a [`Dimension`] vector plus an affine
//! transform to the coherent SI unit of that dimension
//! (`si = value * scale + offset`). Two units are compatible when their
//! dimensions are equal.
//!
//! Conversion works on whole columns so the affine coefficients are derived
//! once per call instead of once per value.

use std::{fmt, str::FromStr};

use snafu::prelude::*;

/// Errors raised by unit resolution and conversion.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum UnitError {
    /// The unit name is not part of the registry.
    #[snafu(display("unknown unit '{name}'"))]
    UnknownUnit {
        /// The name that failed to resolve.
        name: String,
    },

    /// The units measure different physical quantities.
    #[snafu(display("cannot convert '{from}' ({from_dimension}) to '{to}' ({to_dimension})"))]
    IncompatibleUnits {
        /// Source unit name.
        from: String,
        /// Target unit name.
        to: String,
        /// Dimension of the source unit.
        from_dimension: Dimension,
        /// Dimension of the target unit.
        to_dimension: Dimension,
    },
}

/// Result alias for unit operations.
pub type UnitResult<T> = Result<T, UnitError>;

/// Exponents of the base quantities a unit is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimension {
    /// Length (metre).
    pub length: i8,
    /// Mass (kilogram).
    pub mass: i8,
    /// Time (second).
    pub time: i8,
    /// Thermodynamic temperature (kelvin).
    pub temperature: i8,
}

impl Dimension {
    const fn new(length: i8, mass: i8, time: i8, temperature: i8) -> Self {
        Self {
            length,
            mass,
            time,
            temperature,
        }
    }

    /// No dimension (ratios, percentages).
    pub const DIMENSIONLESS: Dimension = Dimension::new(0, 0, 0, 0);
    /// Length.
    pub const LENGTH: Dimension = Dimension::new(1, 0, 0, 0);
    /// Area.
    pub const AREA: Dimension = Dimension::new(2, 0, 0, 0);
    /// Volume.
    pub const VOLUME: Dimension = Dimension::new(3, 0, 0, 0);
    /// Mass.
    pub const MASS: Dimension = Dimension::new(0, 1, 0, 0);
    /// Time.
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0);
    /// Temperature.
    pub const TEMPERATURE: Dimension = Dimension::new(0, 0, 0, 1);
    /// Speed.
    pub const SPEED: Dimension = Dimension::new(1, 0, -1, 0);
    /// Volumetric flow rate.
    pub const VOLUME_FLOW: Dimension = Dimension::new(3, 0, -1, 0);
    /// Energy.
    pub const ENERGY: Dimension = Dimension::new(2, 1, -2, 0);
    /// Power.
    pub const POWER: Dimension = Dimension::new(2, 1, -3, 0);
    /// Pressure.
    pub const PRESSURE: Dimension = Dimension::new(-1, 1, -2, 0);
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Dimension::DIMENSIONLESS {
            return write!(f, "dimensionless");
        }
        let mut first = true;
        for (symbol, exp) in [
            ("L", self.length),
            ("M", self.mass),
            ("T", self.time),
            ("Θ", self.temperature),
        ] {
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, "·")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol}^{exp}")?;
            }
        }
        Ok(())
    }
}

/// A unit of a physical quantity, relative to the SI unit of its dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalUnit {
    /// Conventional symbol, e.g. `"degC"` or `"kWh"`.
    pub symbol: &'static str,
    /// Quantity measured.
    pub dimension: Dimension,
    /// Multiplier to the SI unit.
    pub scale: f64,
    /// Offset added after scaling (non-zero only for relative temperature scales).
    pub offset: f64,
}

impl PhysicalUnit {
    const fn linear(symbol: &'static str, dimension: Dimension, scale: f64) -> Self {
        Self {
            symbol,
            dimension,
            scale,
            offset: 0.0,
        }
    }

    /// Coefficients `(a, b)` such that `to_value = from_value * a + b`.
    fn affine_to(&self, to: &PhysicalUnit) -> (f64, f64) {
        (self.scale / to.scale, (self.offset - to.offset) / to.scale)
    }
}

const CELSIUS_ZERO_K: f64 = 273.15;
const FAHRENHEIT_SCALE: f64 = 5.0 / 9.0;
const JOULES_PER_WATT_HOUR: f64 = 3_600.0;

/// Units series can be declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DomainUnit {
    DegreeCelsius,
    DegreeFahrenheit,
    Kelvin,
    Meter,
    Kilometer,
    SquareMeter,
    CubicMeter,
    Liter,
    Kilogram,
    Second,
    Minute,
    Hour,
    MeterPerSecond,
    KilometerPerHour,
    CubicMeterPerHour,
    CubicMeterPerSecond,
    LiterPerSecond,
    Joule,
    WattHour,
    KilowattHour,
    MegawattHour,
    Watt,
    Kilowatt,
    Megawatt,
    Pascal,
    Hectopascal,
    Bar,
    Percent,
    Ratio,
}

impl DomainUnit {
    /// Every supported unit, in registry order.
    pub const ALL: [DomainUnit; 29] = [
        DomainUnit::DegreeCelsius,
        DomainUnit::DegreeFahrenheit,
        DomainUnit::Kelvin,
        DomainUnit::Meter,
        DomainUnit::Kilometer,
        DomainUnit::SquareMeter,
        DomainUnit::CubicMeter,
        DomainUnit::Liter,
        DomainUnit::Kilogram,
        DomainUnit::Second,
        DomainUnit::Minute,
        DomainUnit::Hour,
        DomainUnit::MeterPerSecond,
        DomainUnit::KilometerPerHour,
        DomainUnit::CubicMeterPerHour,
        DomainUnit::CubicMeterPerSecond,
        DomainUnit::LiterPerSecond,
        DomainUnit::Joule,
        DomainUnit::WattHour,
        DomainUnit::KilowattHour,
        DomainUnit::MegawattHour,
        DomainUnit::Watt,
        DomainUnit::Kilowatt,
        DomainUnit::Megawatt,
        DomainUnit::Pascal,
        DomainUnit::Hectopascal,
        DomainUnit::Bar,
        DomainUnit::Percent,
        DomainUnit::Ratio,
    ];

    /// Domain vocabulary name, e.g. `"DegreeCelsius"`.
    pub fn name(self) -> &'static str {
        match self {
            DomainUnit::DegreeCelsius => "DegreeCelsius",
            DomainUnit::DegreeFahrenheit => "DegreeFahrenheit",
            DomainUnit::Kelvin => "Kelvin",
            DomainUnit::Meter => "Meter",
            DomainUnit::Kilometer => "Kilometer",
            DomainUnit::SquareMeter => "SquareMeter",
            DomainUnit::CubicMeter => "CubicMeter",
            DomainUnit::Liter => "Liter",
            DomainUnit::Kilogram => "Kilogram",
            DomainUnit::Second => "Second",
            DomainUnit::Minute => "Minute",
            DomainUnit::Hour => "Hour",
            DomainUnit::MeterPerSecond => "MeterPerSecond",
            DomainUnit::KilometerPerHour => "KilometerPerHour",
            DomainUnit::CubicMeterPerHour => "CubicMeterPerHour",
            DomainUnit::CubicMeterPerSecond => "CubicMeterPerSecond",
            DomainUnit::LiterPerSecond => "LiterPerSecond",
            DomainUnit::Joule => "Joule",
            DomainUnit::WattHour => "WattHour",
            DomainUnit::KilowattHour => "KilowattHour",
            DomainUnit::MegawattHour => "MegawattHour",
            DomainUnit::Watt => "Watt",
            DomainUnit::Kilowatt => "Kilowatt",
            DomainUnit::Megawatt => "Megawatt",
            DomainUnit::Pascal => "Pascal",
            DomainUnit::Hectopascal => "Hectopascal",
            DomainUnit::Bar => "Bar",
            DomainUnit::Percent => "Percent",
            DomainUnit::Ratio => "Ratio",
        }
    }

    /// The physical unit this domain unit stands for.
    pub fn physical(self) -> PhysicalUnit {
        use Dimension as D;
        match self {
            DomainUnit::DegreeCelsius => PhysicalUnit {
                symbol: "degC",
                dimension: D::TEMPERATURE,
                scale: 1.0,
                offset: CELSIUS_ZERO_K,
            },
            DomainUnit::DegreeFahrenheit => PhysicalUnit {
                symbol: "degF",
                dimension: D::TEMPERATURE,
                scale: FAHRENHEIT_SCALE,
                offset: CELSIUS_ZERO_K - 32.0 * FAHRENHEIT_SCALE,
            },
            DomainUnit::Kelvin => PhysicalUnit::linear("K", D::TEMPERATURE, 1.0),
            DomainUnit::Meter => PhysicalUnit::linear("m", D::LENGTH, 1.0),
            DomainUnit::Kilometer => PhysicalUnit::linear("km", D::LENGTH, 1_000.0),
            DomainUnit::SquareMeter => PhysicalUnit::linear("m²", D::AREA, 1.0),
            DomainUnit::CubicMeter => PhysicalUnit::linear("m³", D::VOLUME, 1.0),
            DomainUnit::Liter => PhysicalUnit::linear("L", D::VOLUME, 1e-3),
            DomainUnit::Kilogram => PhysicalUnit::linear("kg", D::MASS, 1.0),
            DomainUnit::Second => PhysicalUnit::linear("s", D::TIME, 1.0),
            DomainUnit::Minute => PhysicalUnit::linear("min", D::TIME, 60.0),
            DomainUnit::Hour => PhysicalUnit::linear("h", D::TIME, 3_600.0),
            DomainUnit::MeterPerSecond => PhysicalUnit::linear("m/s", D::SPEED, 1.0),
            DomainUnit::KilometerPerHour => {
                PhysicalUnit::linear("km/h", D::SPEED, 1_000.0 / 3_600.0)
            }
            DomainUnit::CubicMeterPerHour => {
                PhysicalUnit::linear("m³/h", D::VOLUME_FLOW, 1.0 / 3_600.0)
            }
            DomainUnit::CubicMeterPerSecond => PhysicalUnit::linear("m³/s", D::VOLUME_FLOW, 1.0),
            DomainUnit::LiterPerSecond => PhysicalUnit::linear("L/s", D::VOLUME_FLOW, 1e-3),
            DomainUnit::Joule => PhysicalUnit::linear("J", D::ENERGY, 1.0),
            DomainUnit::WattHour => PhysicalUnit::linear("Wh", D::ENERGY, JOULES_PER_WATT_HOUR),
            DomainUnit::KilowattHour => {
                PhysicalUnit::linear("kWh", D::ENERGY, 1e3 * JOULES_PER_WATT_HOUR)
            }
            DomainUnit::MegawattHour => {
                PhysicalUnit::linear("MWh", D::ENERGY, 1e6 * JOULES_PER_WATT_HOUR)
            }
            DomainUnit::Watt => PhysicalUnit::linear("W", D::POWER, 1.0),
            DomainUnit::Kilowatt => PhysicalUnit::linear("kW", D::POWER, 1e3),
            DomainUnit::Megawatt => PhysicalUnit::linear("MW", D::POWER, 1e6),
            DomainUnit::Pascal => PhysicalUnit::linear("Pa", D::PRESSURE, 1.0),
            DomainUnit::Hectopascal => PhysicalUnit::linear("hPa", D::PRESSURE, 100.0),
            DomainUnit::Bar => PhysicalUnit::linear("bar", D::PRESSURE, 1e5),
            DomainUnit::Percent => PhysicalUnit::linear("%", D::DIMENSIONLESS, 0.01),
            DomainUnit::Ratio => PhysicalUnit::linear("1", D::DIMENSIONLESS, 1.0),
        }
    }
}

impl fmt::Display for DomainUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DomainUnit {
    type Err = UnitError;

    /// Accepts the domain name (case-insensitive) or the physical symbol.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        DomainUnit::ALL
            .into_iter()
            .find(|u| u.name().eq_ignore_ascii_case(s) || u.physical().symbol == s)
            .context(UnknownUnitSnafu { name: s })
    }
}

/// Resolve a domain unit name to its physical unit.
///
/// `None` means the name is unknown; callers must treat it as a failure.
pub fn resolve(domain_unit_name: &str) -> Option<PhysicalUnit> {
    domain_unit_name
        .parse::<DomainUnit>()
        .ok()
        .map(DomainUnit::physical)
}

/// Check that `from` can be converted to `to` without converting anything.
pub fn check_compatible(from: &str, to: &str) -> UnitResult<()> {
    conversion(from, to).map(|_| ())
}

fn conversion(from: &str, to: &str) -> UnitResult<(f64, f64)> {
    let from_unit = resolve(from).context(UnknownUnitSnafu { name: from })?;
    let to_unit = resolve(to).context(UnknownUnitSnafu { name: to })?;

    ensure!(
        from_unit.dimension == to_unit.dimension,
        IncompatibleUnitsSnafu {
            from,
            to,
            from_dimension: from_unit.dimension,
            to_dimension: to_unit.dimension,
        }
    );

    Ok(from_unit.affine_to(&to_unit))
}

/// Convert a whole column of values from one unit to another.
pub fn convert(values: &[f64], from: &str, to: &str) -> UnitResult<Vec<f64>> {
    let (a, b) = conversion(from, to)?;
    if a == 1.0 && b == 0.0 {
        return Ok(values.to_vec());
    }
    Ok(values.iter().map(|v| v * a + b).collect())
}
