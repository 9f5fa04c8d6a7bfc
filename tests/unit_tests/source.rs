use crate::{split_mesh, two_triangles};
use eyre::eyre;
use fenris_fault::error::ErrorCategory;
use fenris_fault::fault::{
    slip_component_names, KinematicSource, KinematicSourceConfig, SlipFunction, SlipSource, SLIP_TIME_DB_VALUE,
};
use fenris_fault::mesh::Mesh;
use fenris_fault::section::{Section, VectorFieldType};
use fenris_fault::traits::{Scales, UniformDatabase};
use matrixcompare::assert_scalar_eq;

fn diagonal_fault_mesh() -> Mesh<f64> {
    let mut mesh = two_triangles();
    split_mesh(&mut mesh, "fault", &[2, 5])
        .fault_mesh()
        .clone()
}

fn scales() -> Scales<f64> {
    Scales {
        length: 2.0,
        pressure: 1.0,
        time: 4.0,
        density: 1.0,
    }
}

fn slip_at(source: &KinematicSource<f64>, fault_mesh: &Mesh<f64>, t: f64) -> Section<f64> {
    let mut slip = Section::with_uniform_fiber(fault_mesh.vertices(), fault_mesh.space_dim());
    source.slip(&mut slip, t).unwrap();
    slip
}

#[test]
fn step_adds_values_once_slip_time_is_reached() {
    let mut output = [1.0, 1.0];
    SlipFunction::Step.add_slip(&[0.5, -0.5], 2.0, 1.5, &mut output);
    assert_eq!(output, [1.0, 1.0]);
    SlipFunction::Step.add_slip(&[0.5, -0.5], 2.0, 2.0, &mut output);
    assert_eq!(output, [1.5, 0.5]);
}

#[test]
fn constant_rate_grows_linearly_after_slip_time() {
    let mut output = [0.0];
    SlipFunction::ConstantRate.add_slip(&[2.0], 1.0, 1.0, &mut output);
    assert_eq!(output, [0.0]);
    SlipFunction::ConstantRate.add_slip(&[2.0], 1.0, 3.5, &mut output);
    assert_eq!(output, [5.0]);
}

#[test]
fn slip_components_follow_fault_basis() {
    assert_eq!(slip_component_names(1), &["fault-opening"]);
    assert_eq!(slip_component_names(2), &["left-lateral-slip", "fault-opening"]);
    assert_eq!(
        slip_component_names(3),
        &["left-lateral-slip", "reverse-slip", "fault-opening"]
    );
}

#[test]
fn step_source_is_nondimensionalized() {
    let fault_mesh = diagonal_fault_mesh();
    let db = UniformDatabase::new("rupture")
        .with_value("left-lateral-slip", 1.0)
        .with_value("fault-opening", 0.5)
        .with_value(SLIP_TIME_DB_VALUE, 8.0);
    let config = KinematicSourceConfig {
        origin_time: 4.0,
        slip_function: SlipFunction::Step,
    };
    let mut source = KinematicSource::new("rupture", config, db);
    source.initialize(&fault_mesh, &scales()).unwrap();

    assert_eq!(source.label(), "rupture");
    assert_eq!(source.origin_time(), 1.0);
    let final_slip = source.final_slip().unwrap();
    assert_eq!(final_slip.label(), "final_slip");
    assert_eq!(final_slip.scale(), 2.0);
    assert_eq!(final_slip.vector_field_type(), VectorFieldType::Vector);
    assert_eq!(final_slip.section().restrict_point(5).unwrap(), &[0.5, 0.25]);
    assert_eq!(source.slip_time().unwrap().section().restrict_point(2).unwrap(), &[2.0]);

    let slip = slip_at(&source, &fault_mesh, 2.9);
    assert!(slip.values().iter().all(|x| *x == 0.0));
    let slip = slip_at(&source, &fault_mesh, 3.0);
    assert_eq!(slip.restrict_point(2).unwrap(), &[0.5, 0.25]);
    assert_eq!(slip.restrict_point(5).unwrap(), &[0.5, 0.25]);
}

#[test]
fn database_is_queried_at_dimensional_coordinates() {
    let fault_mesh = diagonal_fault_mesh();
    let db = |x: &[f64], names: &[&str]| {
        let values = names
            .iter()
            .map(|name| match *name {
                "left-lateral-slip" => x[0],
                _ => 0.0,
            })
            .collect();
        Ok::<Vec<f64>, eyre::Report>(values)
    };
    let config = KinematicSourceConfig {
        origin_time: 0.0,
        slip_function: SlipFunction::ConstantRate,
    };
    let mut source = KinematicSource::new("creep", config, db);
    source.initialize(&fault_mesh, &scales()).unwrap();

    // Vertex 5 lies at (2, 2) in physical units, and rates are scaled by length / time
    let rate = source.final_slip().unwrap();
    assert_eq!(rate.label(), "slip_rate");
    assert_scalar_eq!(rate.scale(), 0.5, comp = abs, tol = 1e-15);
    assert_eq!(rate.section().restrict_point(5).unwrap(), &[4.0, 0.0]);
    assert_eq!(rate.section().restrict_point(2).unwrap(), &[0.0, 0.0]);

    let slip = slip_at(&source, &fault_mesh, 0.25);
    assert_eq!(slip.restrict_point(5).unwrap(), &[1.0, 0.0]);
}

#[test]
fn database_failures_are_configuration_errors() {
    let fault_mesh = diagonal_fault_mesh();
    let config = KinematicSourceConfig {
        origin_time: 0.0,
        slip_function: SlipFunction::Step,
    };

    // Missing slip time
    let db = UniformDatabase::new("rupture")
        .with_value("left-lateral-slip", 1.0)
        .with_value("fault-opening", 0.5);
    let mut source = KinematicSource::new("rupture", config, db);
    let err = source.initialize(&fault_mesh, &scales()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("rupture"), "{}", err);

    let db = |_: &[f64], _: &[&str]| Err::<Vec<f64>, _>(eyre!("outside of database"));
    let mut source = KinematicSource::new("rupture", config, db);
    let err = source.initialize(&fault_mesh, &scales()).unwrap_err();
    assert!(err.to_string().contains("outside of database"), "{}", err);

    let db = |_: &[f64], _: &[&str]| Ok::<_, eyre::Report>(vec![1.0]);
    let mut source = KinematicSource::new("rupture", config, db);
    let err = source.initialize(&fault_mesh, &scales()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn uninitialized_source_reports_invariant_violation() {
    let config = KinematicSourceConfig {
        origin_time: 0.0,
        slip_function: SlipFunction::Step,
    };
    let source = KinematicSource::new("rupture", config, UniformDatabase::<f64>::new("empty"));
    let mut slip = Section::with_uniform_fiber([0], 2);
    let err = source.slip(&mut slip, 0.0).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvariantViolation);
    assert!(source.final_slip().is_err());
}

#[test]
fn source_config_deserializes_from_json() {
    let config: KinematicSourceConfig = serde_json::from_str(r#"{ "slip_function": "constant-rate" }"#).unwrap();
    assert_eq!(config.origin_time, 0.0);
    assert_eq!(config.slip_function, SlipFunction::ConstantRate);

    let json = serde_json::to_string(&KinematicSourceConfig {
        origin_time: 1.5,
        slip_function: SlipFunction::Step,
    })
    .unwrap();
    assert!(json.contains(r#""step""#), "{}", json);
}
