use crate::{FrictionError, FrictionModel};
use fenris_traits::{Nondimensional, Real};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Slip rates at or below this value are treated as locked.
pub const SLIP_RATE_TOLERANCE: f64 = 1.0e-12;

/// Properties of the [`SlipWeakeningTime`] friction model.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlipWeakeningTimeProperties<T> {
    pub static_coefficient: T,
    pub dynamic_coefficient: T,
    /// Slip over which friction weakens from static to dynamic (d0).
    pub slip_weakening_parameter: T,
    pub cohesion: T,
    /// Time at which time weakening begins.
    pub weakening_time: T,
    /// Duration of time weakening.
    pub weakening_duration: T,
}

/// State variables of the [`SlipWeakeningTime`] friction model.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlipWeakeningTimeState<T> {
    pub cumulative_slip: T,
    pub previous_slip: T,
}

/// Slip-weakening friction combined with forced weakening in time.
///
/// With $\mu_s$ and $\mu_d$ the static and dynamic coefficients, the friction coefficient is
/// $$
/// \mu = \mu_s - (\mu_s - \mu_d) \max(w_s, w_t),
/// $$
/// where $w_s = \min(1, \delta / d_0)$ is the slip weakening and $w_t$ ramps linearly from
/// 0 to 1 over the time-weakening window. The resistance is $-\mu \sigma_n + c$ for a fault in
/// compression ($\sigma_n \leq 0$) and zero otherwise.
///
/// The cumulative slip $\delta$ seen by the friction evaluation includes the tentative
/// increment since the previous completed step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipWeakeningTime;

const DB_PROPERTIES: [&str; 6] = [
    "static-coefficient",
    "dynamic-coefficient",
    "slip-weakening-parameter",
    "cohesion",
    "time-weakening-time",
    "time-weakening-parameter",
];

const DB_STATE_VARS: [&str; 2] = ["cumulative-slip", "previous-slip"];

fn check_value_count(expected: usize, values: &[impl Copy]) -> Result<(), FrictionError> {
    if values.len() != expected {
        return Err(FrictionError::ValueCountMismatch {
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

fn invalid<T: Real>(property: &'static str, requirement: &str, value: T) -> FrictionError {
    FrictionError::InvalidProperty {
        property,
        message: format!("spatial database returned {:?}, which is {}", value, requirement),
    }
}

impl SlipWeakeningTime {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn slip_weakening<T: Real>(properties: &SlipWeakeningTimeProperties<T>, cumulative_slip: T) -> T {
        if cumulative_slip >= properties.slip_weakening_parameter {
            1.0
        } else {
            cumulative_slip / properties.slip_weakening_parameter
        }
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn time_weakening<T: Real>(properties: &SlipWeakeningTimeProperties<T>, t: T) -> T {
        if t < properties.weakening_time {
            0.0
        } else if t < properties.weakening_time + properties.weakening_duration {
            (t - properties.weakening_time) / properties.weakening_duration
        } else {
            1.0
        }
    }

    fn tentative_cumulative_slip<T: Real>(state: &SlipWeakeningTimeState<T>, slip: T) -> T {
        state.cumulative_slip + (slip - state.previous_slip).abs()
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> FrictionModel<T> for SlipWeakeningTime {
    type Properties = SlipWeakeningTimeProperties<T>;
    type State = SlipWeakeningTimeState<T>;

    fn db_properties(&self) -> &'static [&'static str] {
        &DB_PROPERTIES
    }

    fn db_state_vars(&self) -> &'static [&'static str] {
        &DB_STATE_VARS
    }

    fn properties_from_db(&self, db_values: &[T]) -> Result<Self::Properties, FrictionError> {
        check_value_count(DB_PROPERTIES.len(), db_values)?;
        let properties = SlipWeakeningTimeProperties {
            static_coefficient: db_values[0],
            dynamic_coefficient: db_values[1],
            slip_weakening_parameter: db_values[2],
            cohesion: db_values[3],
            weakening_time: db_values[4],
            weakening_duration: db_values[5],
        };

        if properties.static_coefficient < 0.0 {
            return Err(invalid("static coefficient", "negative", properties.static_coefficient));
        }
        if properties.dynamic_coefficient < 0.0 {
            return Err(invalid("dynamic coefficient", "negative", properties.dynamic_coefficient));
        }
        if properties.slip_weakening_parameter <= 0.0 {
            return Err(invalid(
                "slip weakening parameter",
                "not positive",
                properties.slip_weakening_parameter,
            ));
        }
        if properties.weakening_time < 0.0 {
            return Err(invalid("time-weakening time", "negative", properties.weakening_time));
        }
        if properties.weakening_duration <= 0.0 {
            return Err(invalid(
                "time-weakening parameter",
                "not positive",
                properties.weakening_duration,
            ));
        }
        Ok(properties)
    }

    fn state_vars_from_db(&self, db_values: &[T]) -> Result<Self::State, FrictionError> {
        check_value_count(DB_STATE_VARS.len(), db_values)?;
        Ok(SlipWeakeningTimeState {
            cumulative_slip: db_values[0],
            previous_slip: db_values[1],
        })
    }

    fn initial_state(&self) -> Self::State {
        SlipWeakeningTimeState {
            cumulative_slip: 0.0,
            previous_slip: 0.0,
        }
    }

    fn nondim_properties<N: Nondimensional<T> + ?Sized>(&self, properties: &mut Self::Properties, normalizer: &N) {
        let length = normalizer.length_scale();
        let pressure = normalizer.pressure_scale();
        let time = normalizer.time_scale();
        properties.slip_weakening_parameter = normalizer.nondimensionalize(properties.slip_weakening_parameter, length);
        properties.cohesion = normalizer.nondimensionalize(properties.cohesion, pressure);
        properties.weakening_time = normalizer.nondimensionalize(properties.weakening_time, time);
        properties.weakening_duration = normalizer.nondimensionalize(properties.weakening_duration, time);
    }

    fn dim_properties<N: Nondimensional<T> + ?Sized>(&self, properties: &mut Self::Properties, normalizer: &N) {
        let length = normalizer.length_scale();
        let pressure = normalizer.pressure_scale();
        let time = normalizer.time_scale();
        properties.slip_weakening_parameter = normalizer.dimensionalize(properties.slip_weakening_parameter, length);
        properties.cohesion = normalizer.dimensionalize(properties.cohesion, pressure);
        properties.weakening_time = normalizer.dimensionalize(properties.weakening_time, time);
        properties.weakening_duration = normalizer.dimensionalize(properties.weakening_duration, time);
    }

    fn nondim_state_vars<N: Nondimensional<T> + ?Sized>(&self, state: &mut Self::State, normalizer: &N) {
        let length = normalizer.length_scale();
        state.cumulative_slip = normalizer.nondimensionalize(state.cumulative_slip, length);
        state.previous_slip = normalizer.nondimensionalize(state.previous_slip, length);
    }

    fn dim_state_vars<N: Nondimensional<T> + ?Sized>(&self, state: &mut Self::State, normalizer: &N) {
        let length = normalizer.length_scale();
        state.cumulative_slip = normalizer.dimensionalize(state.cumulative_slip, length);
        state.previous_slip = normalizer.dimensionalize(state.previous_slip, length);
    }

    fn calc_friction(
        &self,
        t: T,
        slip: T,
        _slip_rate: T,
        normal_traction: T,
        properties: &Self::Properties,
        state: &Self::State,
    ) -> T {
        // Tensile normal traction: the fault is open and carries no shear
        if normal_traction > 0.0 {
            return 0.0;
        }
        let slip_cum = Self::tentative_cumulative_slip(state, slip);
        let slip_weak = Self::slip_weakening(properties, slip_cum);
        let time_weak = Self::time_weakening(properties, t);
        let mu_s = properties.static_coefficient;
        let mu_d = properties.dynamic_coefficient;
        let mu_f = mu_s - (mu_s - mu_d) * slip_weak.max(time_weak);
        -mu_f * normal_traction + properties.cohesion
    }

    fn calc_friction_deriv(
        &self,
        t: T,
        slip: T,
        _slip_rate: T,
        normal_traction: T,
        properties: &Self::Properties,
        state: &Self::State,
    ) -> T {
        if normal_traction > 0.0 {
            return 0.0;
        }
        let slip_cum = Self::tentative_cumulative_slip(state, slip);
        let slip_weak = Self::slip_weakening(properties, slip_cum);
        let time_weak = Self::time_weakening(properties, t);
        let d0 = properties.slip_weakening_parameter;
        if slip_weak > time_weak && slip_cum < d0 {
            normal_traction * (properties.static_coefficient - properties.dynamic_coefficient) / d0
        } else {
            0.0
        }
    }

    fn update_state_vars(
        &self,
        _t: T,
        slip: T,
        slip_rate: T,
        _normal_traction: T,
        state: &mut Self::State,
        _properties: &Self::Properties,
    ) {
        let tolerance = T::from_f64(SLIP_RATE_TOLERANCE).expect("Literal must fit in T");
        if slip_rate > tolerance {
            let slip_prev = state.previous_slip;
            state.previous_slip = slip;
            state.cumulative_slip += (slip - slip_prev).abs();
        } else {
            // Sliding has stopped, the fault locks and weakening starts over
            state.previous_slip = slip;
            state.cumulative_slip = 0.0;
        }
    }
}
