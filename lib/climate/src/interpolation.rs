use std::fmt::Display;

use support::time::{DateTime, Duration};

use crate::State;

/// Setpoint over a time interval: either constant or a linear blend between
/// two states.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpolation {
    Static(State),
    Blend {
        from: State,
        to: State,
        start: DateTime,
        duration: Duration,
    },
}

impl Interpolation {
    /// Setpoint at `at`. Blends are clamped to their endpoints outside of their interval.
    pub fn state(&self, at: DateTime) -> State {
        match self {
            Interpolation::Static(state) => state.clone(),
            Interpolation::Blend {
                from,
                to,
                start,
                duration,
            } => from.blend(to, completion(*start, *duration, at)),
        }
    }

    /// The state a blend resolves to. `None` for a static interpolation.
    pub fn end(&self) -> Option<&State> {
        match self {
            Interpolation::Static(_) => None,
            Interpolation::Blend { to, .. } => Some(to),
        }
    }

    /// When a blend completes. `None` for a static interpolation or a blend
    /// ending beyond the representable time range.
    pub fn end_time(&self) -> Option<DateTime> {
        match self {
            Interpolation::Static(_) => None,
            Interpolation::Blend { start, duration, .. } => start.checked_add(*duration),
        }
    }

    pub fn describe(&self) -> String {
        self.to_string()
    }
}

fn completion(start: DateTime, duration: Duration, at: DateTime) -> f64 {
    if duration.is_zero() {
        return if at >= start { 1.0 } else { 0.0 };
    }

    ((at - start).as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

impl Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interpolation::Static(state) => write!(f, "Static[{}]", state.name),
            Interpolation::Blend {
                from,
                to,
                start,
                duration,
            } => write!(f, "Blend[{} -> {} from {} for {}]", from.name, to.name, start, duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Humidity, Temperature, Unit, Wind};
    use support::t;

    fn blend() -> Interpolation {
        Interpolation::Blend {
            from: State::new("night").with_temperature(20.0).with_humidity(80.0),
            to: State::new("day").with_temperature(30.0).with_wind(40.0),
            start: DateTime::from_iso("2024-01-01T06:00:00Z").unwrap(),
            duration: t!(30 minutes),
        }
    }

    fn at(iso: &str) -> DateTime {
        DateTime::from_iso(iso).unwrap()
    }

    #[test]
    fn test_blend_endpoints_and_midpoint() {
        let blend = blend();

        assert_eq!(blend.state(at("2024-01-01T06:00:00Z")).temperature, Temperature(20.0));
        assert_eq!(blend.state(at("2024-01-01T06:15:00Z")).temperature, Temperature(25.0));
        assert_eq!(blend.state(at("2024-01-01T06:30:00Z")).temperature, Temperature(30.0));
    }

    #[test]
    fn test_blend_clamps_outside_of_interval() {
        let blend = blend();

        assert_eq!(blend.state(at("2024-01-01T05:00:00Z")).temperature, Temperature(20.0));
        assert_eq!(blend.state(at("2024-01-02T05:00:00Z")).temperature, Temperature(30.0));
        assert_eq!(blend.state(at("2024-01-02T05:00:00Z")).name, "day");
    }

    #[test]
    fn test_blend_with_undefined_units() {
        let state = blend().state(at("2024-01-01T06:10:00Z"));

        assert_eq!(state.humidity, Humidity(80.0));
        assert_eq!(state.wind, Wind(40.0));
        assert!(state.uv_light.is_undefined());
    }

    #[test]
    fn test_zero_duration_blend() {
        let blend = Interpolation::Blend {
            from: State::new("a").with_temperature(10.0),
            to: State::new("b").with_temperature(12.0),
            start: at("2024-01-01T06:00:00Z"),
            duration: Duration::zero(),
        };

        assert_eq!(blend.state(at("2024-01-01T05:59:59Z")).temperature, Temperature(10.0));
        assert_eq!(blend.state(at("2024-01-01T06:00:00Z")).temperature, Temperature(12.0));
    }

    #[test]
    fn test_static() {
        let state = State::new("night").with_temperature(20.0);
        let interpolation = Interpolation::Static(state.clone());

        assert_eq!(interpolation.state(t!(now)), state);
        assert_eq!(interpolation.end(), None);
        assert_eq!(interpolation.end_time(), None);
        assert_eq!(interpolation.describe(), "Static[night]");
    }

    #[test]
    fn test_end() {
        let blend = blend();

        assert_eq!(blend.end().map(|s| s.name.as_str()), Some("day"));
        assert_eq!(blend.end_time(), Some(at("2024-01-01T06:30:00Z")));
        assert_eq!(
            blend.describe(),
            "Blend[night -> day from 2024-01-01 06:00:00 for PT30M]"
        );
    }

    #[test]
    fn test_blend_ending_beyond_last_day() {
        let start = DateTime::midnight(chrono::NaiveDate::MAX) + t!(23 hours) + t!(59 minutes);
        let blend = Interpolation::Blend {
            from: State::new("a").with_temperature(20.0),
            to: State::new("b").with_temperature(30.0),
            start,
            duration: t!(30 minutes),
        };

        assert_eq!(blend.end_time(), None);
        let Temperature(temperature) = blend.state(start + t!(3 minutes)).temperature;
        assert!((temperature - 21.0).abs() < 1e-9, "{temperature}");
    }
}
