use std::fmt::Display;

use derive_more::derive::AsRef;

/// Sentinel for a quantity that is not actively controlled.
pub const UNDEFINED: f64 = f64::NEG_INFINITY;

/// A bounded physical quantity of a climate setpoint.
pub trait Unit: Copy + PartialEq + Display {
    const MIN: f64;
    const MAX: f64;

    fn new(value: f64) -> Self;

    fn value(&self) -> f64;

    fn undefined() -> Self {
        Self::new(UNDEFINED)
    }

    fn min_value(&self) -> f64 {
        Self::MIN
    }

    fn max_value(&self) -> f64 {
        Self::MAX
    }

    fn is_undefined(&self) -> bool {
        self.value() == UNDEFINED
    }

    fn clamp(&self) -> Self {
        Self::new(self.value().max(Self::MIN).min(Self::MAX))
    }

    /// Linear blend towards `to`. An undefined endpoint never takes part in the
    /// arithmetic: the defined side wins, two undefined sides stay undefined.
    fn blend(&self, to: &Self, completion: f64) -> Self {
        match (self.is_undefined(), to.is_undefined()) {
            (true, _) => *to,
            (false, true) => *self,
            (false, false) if completion <= 0.0 => *self,
            (false, false) if completion >= 1.0 => *to,
            (false, false) => Self::new(self.value() + (to.value() - self.value()) * completion),
        }
    }
}

macro_rules! climate_unit {
    ($name:ident, $min:literal, $max:literal, $symbol:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsRef)]
        pub struct $name(pub f64);

        impl Unit for $name {
            const MIN: f64 = $min;
            const MAX: f64 = $max;

            fn new(value: f64) -> Self {
                Self(value)
            }

            fn value(&self) -> f64 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::undefined()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                if self.is_undefined() {
                    write!(f, "undefined")
                } else {
                    write!(f, "{:.2} {}", self.0, $symbol)
                }
            }
        }

        impl From<Option<f64>> for $name {
            fn from(value: Option<f64>) -> Self {
                value.map_or_else(Self::undefined, $name)
            }
        }

        impl From<$name> for Option<f64> {
            fn from(value: $name) -> Self {
                if value.is_undefined() { None } else { Some(value.0) }
            }
        }

        impl From<$name> for f64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

climate_unit!(Temperature, 0.0, 50.0, "°C");
climate_unit!(Humidity, 0.0, 100.0, "%");
climate_unit!(Wind, 0.0, 100.0, "%");
climate_unit!(VisibleLight, 0.0, 100.0, "%");
climate_unit!(UvLight, 0.0, 100.0, "%");
