//! Integration tests for loading and saving models through the file store.

use morph_face::{
    load_morphable_model, obj::save_obj, reconstruct, sampler, Blendshape, Channel, Coefficients,
    Error, ErrorKind, ExpressionModel, FileStore, ModelStore, MorphableModel, PcaModel, Point3,
    Rgb, Session, Spread, Topology, Triangle, Viewport,
};
use ndarray::{array, Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::Write;
use std::path::Path;

/// A unit square: four vertices, two triangles, two shape components and one
/// color component.
fn square_model() -> MorphableModel {
    let mean = array![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0,
    ];
    let basis = Array2::from_shape_fn((12, 2), |(r, c)| match (r, c) {
        (2, 0) | (5, 0) => 1.0, // lift the bottom edge
        (8, 1) | (11, 1) => 1.0, // lift the top edge
        _ => 0.0,
    });
    let shape = PcaModel::new(mean, basis, array![1.0, 1.0]).unwrap();
    let color = PcaModel::new(
        Array1::from_elem(12, 0.5),
        Array2::from_elem((12, 1), 0.25),
        array![1.0],
    )
    .unwrap();
    let topology = Topology::new(vec![[0, 1, 2], [0, 2, 3]])
        .with_texcoords(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);

    MorphableModel::new(shape, Some(color), None, topology).unwrap()
}

fn square_blendshapes() -> Vec<Blendshape> {
    let mut pucker = vec![0.0; 12];
    pucker[0] = 0.5;
    let mut open = vec![0.0; 12];
    open[10] = -0.25;
    vec![Blendshape::new("pucker", pucker), Blendshape::new("open", open)]
}

fn write_u32(v: &mut Vec<u8>, val: u32) {
    v.extend_from_slice(&val.to_le_bytes());
}

fn write_f64s(v: &mut Vec<u8>, vals: &[f64]) {
    for val in vals {
        v.extend_from_slice(&val.to_le_bytes());
    }
}

/// The square as a legacy file, without a color model.
fn square_scm() -> Vec<u8> {
    let mut data = Vec::new();
    write_u32(&mut data, 4);
    write_u32(&mut data, 2);
    for i in [0, 1, 2, 0, 2, 3] {
        write_u32(&mut data, i);
    }

    // Shape: one component moving vertex 0 along z, eigenvalue 9.
    write_u32(&mut data, 1);
    write_u32(&mut data, 12);
    let mut column = vec![0.0; 12];
    column[2] = 1.0;
    write_f64s(&mut data, &column);
    write_u32(&mut data, 12);
    write_f64s(
        &mut data,
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
    );
    write_u32(&mut data, 1);
    write_f64s(&mut data, &[9.0]);

    // No color.
    for _ in 0..4 {
        write_u32(&mut data, 0);
    }
    data
}

fn write_file(path: &Path, bytes: &[u8]) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(bytes).unwrap();
}

#[test]
fn native_model_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("square.bin");
    let model = square_model().with_blendshapes(square_blendshapes()).unwrap();

    FileStore.save_model(&path, &model).unwrap();
    let loaded = load_morphable_model(&FileStore, &path).unwrap();

    assert_eq!(loaded, model);
    assert_eq!(loaded.num_expression_components(), 2);
    assert!(loaded.topology().has_texcoords());
}

#[test]
fn compressed_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("square.bin.bz2");
    let blendshapes_path = dir.path().join("expressions.bin.bz2");

    FileStore.save_model(&model_path, &square_model()).unwrap();
    FileStore
        .save_blendshapes(&blendshapes_path, &square_blendshapes())
        .unwrap();

    let model = load_morphable_model(&FileStore, &model_path).unwrap();
    let blendshapes = FileStore.load_blendshapes(&blendshapes_path).unwrap();
    assert_eq!(model, square_model());
    assert_eq!(blendshapes, square_blendshapes());
}

#[test]
fn legacy_model_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("square.scm");
    write_file(&path, &square_scm());

    let model = load_morphable_model(&FileStore, &path).unwrap();
    assert_eq!(model.num_vertices(), 4);
    assert_eq!(model.topology().num_triangles(), 2);
    assert!(!model.has_color());

    // sqrt(9) = 3 per unit coefficient.
    let mesh = model.sample(&[1.0], &[]).unwrap();
    assert!((mesh.vertices[0].z - 3.0).abs() < 1e-6);
    assert!(mesh.colors.is_empty());
}

#[test]
fn compressed_legacy_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("square.scm.bz2");
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
    encoder.write_all(&square_scm()).unwrap();
    encoder.finish().unwrap();

    let model = load_morphable_model(&FileStore, &path).unwrap();
    assert_eq!(model.num_shape_components(), 1);
}

#[test]
fn load_errors_are_classified() {
    let dir = tempfile::tempdir().unwrap();

    let missing = load_morphable_model(&FileStore, &dir.path().join("missing.bin")).unwrap_err();
    assert!(matches!(missing, Error::Io(_)));
    assert_eq!(missing.kind(), ErrorKind::Load);

    let wrong_suffix = load_morphable_model(&FileStore, &dir.path().join("square.ply")).unwrap_err();
    assert_eq!(wrong_suffix.kind(), ErrorKind::Usage);

    // A blendshape archive is not a model.
    let path = dir.path().join("expressions.bin");
    FileStore.save_blendshapes(&path, &square_blendshapes()).unwrap();
    let wrong_type = load_morphable_model(&FileStore, &path).unwrap_err();
    assert!(matches!(wrong_type, Error::WrongArchive { .. }));

    let garbage = dir.path().join("garbage.bin");
    write_file(&garbage, b"not a model at all");
    assert_eq!(
        load_morphable_model(&FileStore, &garbage).unwrap_err().kind(),
        ErrorKind::Load
    );

    let empty_set = dir.path().join("empty.bin");
    FileStore.save_blendshapes(&empty_set, &[]).unwrap();
    assert!(matches!(
        FileStore.load_blendshapes(&empty_set),
        Err(Error::InvalidModel(_))
    ));
}

#[test]
fn pca_expression_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pca_expression.bin");
    let expression = PcaModel::new(
        Array1::from_elem(12, 0.1),
        Array2::from_shape_fn((12, 3), |(r, c)| ((r + c) % 4) as f32 * 0.05),
        array![0.5, 0.25, 0.125],
    )
    .unwrap();
    let model = square_model()
        .with_expression(ExpressionModel::Pca(expression))
        .unwrap();
    FileStore.save_model(&path, &model).unwrap();

    let loaded = FileStore.load_model(&path).unwrap();
    let coefficients = Coefficients {
        shape: vec![0.5],
        expression: vec![1.0, -1.0, 2.0],
        color: vec![],
    };
    assert_eq!(
        reconstruct(&loaded, &coefficients).unwrap(),
        reconstruct(&model, &coefficients).unwrap()
    );
}

#[test]
fn random_sample_to_obj() {
    let dir = tempfile::tempdir().unwrap();
    let obj_path = dir.path().join("sample.obj");
    let model = square_model().with_blendshapes(square_blendshapes()).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let coefficients = sampler::draw(&model, &mut rng, Spread::uniform(0.5)).unwrap();
    let mesh = reconstruct(&model, &coefficients).unwrap();
    save_obj(&obj_path, &mesh).unwrap();

    let text = std::fs::read_to_string(&obj_path).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
    assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 4);
    assert!(text.contains("f 1/1 2/2 3/3"));
    assert!(text.contains("f 1/1 3/3 4/4"));
}

#[derive(Default)]
struct CountingViewport {
    vertex_count: usize,
    triangle_count: usize,
    last_vertices: Vec<Point3>,
}

impl Viewport for CountingViewport {
    fn set_mesh(&mut self, vertices: &[Point3], triangles: &[Triangle]) {
        self.vertex_count = vertices.len();
        self.triangle_count = triangles.len();
        self.last_vertices = vertices.to_vec();
    }

    fn set_vertices(&mut self, vertices: &[Point3]) {
        assert_eq!(vertices.len(), self.vertex_count);
        self.last_vertices = vertices.to_vec();
    }

    fn set_colors(&mut self, colors: &[Rgb]) {
        assert!(colors.is_empty() || colors.len() == self.vertex_count);
    }
}

#[test]
fn session_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("square.bin");
    let blendshapes_path = dir.path().join("expressions.bin");
    FileStore.save_model(&model_path, &square_model()).unwrap();
    FileStore
        .save_blendshapes(&blendshapes_path, &square_blendshapes())
        .unwrap();

    let mut session = Session::new(CountingViewport::default());
    session.load(&FileStore, &model_path, None).unwrap();
    assert_eq!(session.viewport().triangle_count, 2);
    assert!(!session.model().unwrap().has_expression());

    session.load_blendshapes(&FileStore, &blendshapes_path).unwrap();
    session.set_coefficient(Channel::Expression, 0, 1.0).unwrap();
    assert_eq!(session.viewport().last_vertices[0], Point3::new(0.5, 0.0, 0.0));

    let mut rng = ChaCha8Rng::seed_from_u64(9);
    session.randomize(&mut rng, Spread::default()).unwrap();
    session.reset_to_mean().unwrap();
    assert_eq!(
        session.viewport().last_vertices,
        session.model().unwrap().mean_mesh().vertices
    );

    // A broken file leaves the merged model in place.
    let broken = dir.path().join("broken.scm");
    write_file(&broken, &[1, 0, 0]);
    assert!(session.load(&FileStore, &broken, None).is_err());
    assert!(session.model().unwrap().has_expression());
}

#[test]
fn corrupt_archive_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("square.bin");
    let corrupt = dir.path().join("corrupt.bin");
    FileStore.save_model(&model_path, &square_model()).unwrap();

    let mut data = Vec::new();
    data.extend_from_slice(b"MFBS");
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&1u64.to_le_bytes());
    data.extend_from_slice(&(1u64 << 44).to_le_bytes());
    data.extend_from_slice(b"abc");
    write_file(&corrupt, &data);

    let err = FileStore.load_blendshapes(&corrupt).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);

    let mut session = Session::new(CountingViewport::default());
    session.load(&FileStore, &model_path, None).unwrap();
    assert!(session.load_blendshapes(&FileStore, &corrupt).is_err());
    assert!(!session.model().unwrap().has_expression());
    assert_eq!(session.viewport().triangle_count, 2);
}
