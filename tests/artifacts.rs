use latticegen::core::DensityMode;
use latticegen::error::{Error, Result};
use latticegen::io::{self, DirectorySink, MemorySink};
use latticegen::{pipeline, GeneratorConfig};
use std::fs;
use std::path::{Path, PathBuf};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "latticegen-it-{tag}-{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn preset(name: &str) -> Result<GeneratorConfig> {
    GeneratorConfig::preset(name)
        .ok_or_else(|| Error::InvalidParam(format!("missing preset {name}")))
}

fn scenario(file: &str) -> Result<GeneratorConfig> {
    GeneratorConfig::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file))
}

/// Shipped scenario files describe the same runs as the built-in presets.
#[test]
fn scenario_files_match_presets() -> Result<()> {
    assert_eq!(scenario("dam_coarse.toml")?, preset("dam_coarse")?);
    assert_eq!(scenario("dam_miles.toml")?, preset("dam_miles")?);
    Ok(())
}

/// Identical inputs give byte-identical artifacts.
#[test]
fn generation_is_idempotent() -> Result<()> {
    let cfg = preset("dam_miles")?;
    let mut a = MemorySink::new();
    let mut b = MemorySink::new();
    pipeline::run(&cfg, &mut a)?;
    pipeline::run(&cfg, &mut b)?;
    assert_eq!(a, b);

    let dir = scratch_dir("idempotent");
    let mut sink = DirectorySink::new(&dir)?;
    pipeline::run(&cfg, &mut sink)?;
    let first = (fs::read(dir.join("dam_miles.in"))?, fs::read(dir.join("dam_miles.par"))?);
    pipeline::run(&cfg, &mut sink)?;
    let second = (fs::read(dir.join("dam_miles.in"))?, fs::read(dir.join("dam_miles.par"))?);
    assert_eq!(first, second);
    assert_eq!(a.contents("dam_miles.in").map(String::into_bytes), Some(first.0));
    fs::remove_dir_all(&dir)?;
    Ok(())
}

/// The fine dam reproduces the reference parameter file.
#[test]
fn fine_dam_parameter_file() -> Result<()> {
    let mut sink = MemorySink::new();
    pipeline::run(&preset("dam_miles")?, &mut sink)?;
    let par = sink.contents("dam_miles.par").unwrap_or_default();
    assert_eq!(
        par,
        "\
part_input_file       dam_miles.in
time_end              10.0
timestep_length       0.01
x_min                 0.0
x_max                 0.5
y_min                 0.0
y_max                 0.5
z_min                 0.0
z_max                 0.5
x_n                   25
y_n                   25
z_n                   25
density               74.08800000000002
"
    );
    let particles = sink.lines("dam_miles.in").unwrap_or_default();
    assert_eq!(particles[0], "9261");
    assert_eq!(particles[1], "1.0 0.01 0.2 0.2 0.2 0.0 0.0 0.0");
    assert_eq!(particles[2], "1.0 0.01 0.2 0.2 0.21000000000000002 0.0 0.0 0.0");
    Ok(())
}

/// Written pairs read back to the values they were generated from.
#[test]
fn written_pair_reads_back() -> Result<()> {
    let cfg = scenario("dam_miles_vtk.toml")?;
    let dir = scratch_dir("readback");
    let mut sink = DirectorySink::new(&dir)?;
    let plan = pipeline::run(&cfg, &mut sink)?;

    let params = io::read_parameters(&dir.join("dam_miles_vtk.par"))?;
    assert_eq!(params, plan.params);
    assert_eq!(params.output.cl_workgroup_1dsize, Some(256));

    let particles = io::read_particles(&dir.join("dam_miles_vtk.in"))?;
    let expected: Vec<_> = plan.lattice.iter().collect();
    assert_eq!(particles, expected);
    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn verify_accepts_generated_pairs() -> Result<()> {
    for (name, mode) in [("dam_coarse", DensityMode::Number), ("dam_miles", DensityMode::Mass)] {
        let dir = scratch_dir(&format!("verify-{name}"));
        let mut sink = DirectorySink::new(&dir)?;
        pipeline::run(&preset(name)?, &mut sink)?;
        let report = io::verify(&dir.join(format!("{name}.par")))?;
        assert!(report.is_consistent(), "{name}: {:?}", report.issues);
        assert_eq!(report.particle_count, 9261);
        assert_eq!(report.lattice_counts, [21, 21, 21]);
        assert_eq!(report.density_mode, Some(mode));
        fs::remove_dir_all(&dir)?;
    }
    Ok(())
}

#[test]
fn verify_detects_a_truncated_particle_file() -> Result<()> {
    let dir = scratch_dir("truncated");
    let mut sink = DirectorySink::new(&dir)?;
    pipeline::run(&preset("dam_coarse")?, &mut sink)?;
    let path = dir.join("dam_coarse.in");
    let text = fs::read_to_string(&path)?;
    let kept: Vec<&str> = text.lines().take(100).collect();
    fs::write(&path, kept.join("\n"))?;

    let err = io::verify(&dir.join("dam_coarse.par")).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err}");
    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn verify_flags_a_foreign_density() -> Result<()> {
    let dir = scratch_dir("foreign-density");
    let mut sink = DirectorySink::new(&dir)?;
    pipeline::run(&preset("dam_coarse")?, &mut sink)?;
    let path = dir.join("dam_coarse.par");
    let text = fs::read_to_string(&path)?.replace("9.261", "1234.5");
    fs::write(&path, text)?;

    let report = io::verify(&path)?;
    assert!(!report.is_consistent());
    assert_eq!(report.density_mode, None);
    fs::remove_dir_all(&dir)?;
    Ok(())
}

/// A missing particle file is reported by its own name, not the parameter file's.
#[test]
fn verify_names_a_missing_particle_file() -> Result<()> {
    let dir = scratch_dir("missing-particles");
    let mut sink = DirectorySink::new(&dir)?;
    pipeline::run(&preset("dam_coarse")?, &mut sink)?;
    fs::remove_file(dir.join("dam_coarse.in"))?;

    let err = io::verify(&dir.join("dam_coarse.par")).unwrap_err();
    assert!(matches!(err, Error::Read { .. }), "{err}");
    assert!(err.to_string().contains("dam_coarse.in"), "{err}");
    fs::remove_dir_all(&dir)?;
    Ok(())
}

/// Scenario names may place the pair in a subdirectory of the output root.
#[test]
fn nested_scenario_name_writes_into_subdirectory() -> Result<()> {
    let mut cfg = preset("dam_coarse")?;
    cfg.name = "runs/dam".into();
    let dir = scratch_dir("nested");
    let mut sink = DirectorySink::new(&dir)?;
    let plan = pipeline::run(&cfg, &mut sink)?;
    assert_eq!(plan.params.part_input_file, "runs/dam.in");
    assert!(dir.join("runs/dam.in").is_file());
    assert!(dir.join("runs/dam.par").is_file());
    assert_eq!(fs::read_dir(dir.join("runs"))?.count(), 2);

    let report = io::verify(&dir.join("runs/dam.par"))?;
    assert!(report.is_consistent(), "{:?}", report.issues);
    assert_eq!(report.particle_file, dir.join("runs/dam.in"));
    fs::remove_dir_all(&dir)?;
    Ok(())
}

/// Invalid geometry is reported before anything reaches the output directory.
#[test]
fn invalid_geometry_produces_no_files() -> Result<()> {
    let mut cfg = preset("dam_coarse")?;
    cfg.region.min[2] = cfg.region.max[2];
    let dir = scratch_dir("invalid");
    let mut sink = DirectorySink::new(&dir)?;
    let err = pipeline::run(&cfg, &mut sink).unwrap_err();
    assert!(matches!(err, Error::InvalidGeometry(_)), "{err}");
    drop(sink);
    assert_eq!(fs::read_dir(&dir)?.count(), 0);
    fs::remove_dir_all(&dir)?;
    Ok(())
}
