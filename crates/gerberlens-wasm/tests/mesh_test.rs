//! Integration tests for triangle meshes of fixture layers.

use gerberlens_wasm::geometry::{build_layer_mesh, LayerGeometry};
use gerberlens_wasm::gerber::parse;
use gerberlens_wasm::layers::UploadedFile;
use gerberlens_wasm::{get_indices, get_positions, layer_mesh_internal, load_files_internal};

fn assert_mesh_invariants(geom: &LayerGeometry) {
    assert_eq!(
        geom.positions.len(),
        geom.vertex_count as usize * 2,
        "positions length should match vertex_count * 2"
    );
    assert_eq!(geom.indices.len() % 3, 0, "indices should form triangles");

    let vertex_count = geom.vertex_count;
    for idx in &geom.indices {
        assert!(
            *idx < vertex_count,
            "index {idx} out of bounds for {vertex_count} vertices"
        );
    }
}

/// KiCad copper layer: two draws and three flashes, arcs ignored.
#[test]
fn kicad_copper_mesh_invariants() {
    let parsed = parse(include_str!("fixtures/kicad/board-F_Cu.gbr"));
    let geom = build_layer_mesh(&parsed);

    assert_eq!(geom.command_count, 5);
    assert!(geom.vertex_count > 0, "should produce geometry");
    assert!(geom.warnings.is_empty(), "{:?}", geom.warnings);
    assert_mesh_invariants(&geom);
}

/// Mesh bounds include the aperture extent around the outline path.
#[test]
fn outline_mesh_bounds_include_stroke_width() {
    let parsed = parse(include_str!("fixtures/kicad/board-Edge_Cuts.gbr"));
    let geom = build_layer_mesh(&parsed);

    assert_mesh_invariants(&geom);
    assert!(geom.bounds.min_x < 0.0 && geom.bounds.min_x > -0.1);
    assert!(geom.bounds.max_x > 40.0 && geom.bounds.max_x < 40.1);
}

/// Region contents are still meshed as plain draws.
#[test]
fn altium_layer_with_region_meshes() {
    let parsed = parse(include_str!("fixtures/altium/board.GTL"));
    let geom = build_layer_mesh(&parsed);

    assert_eq!(geom.command_count, 4);
    assert_mesh_invariants(&geom);
}

/// The drill file carries no Gerber operations and meshes to nothing.
#[test]
fn excellon_text_meshes_empty() {
    let geom = build_layer_mesh(&parse(include_str!("fixtures/kicad/board.drl")));
    assert_eq!(geom.vertex_count, 0);
    assert!(geom.indices.is_empty());
}

/// Buffers exported to the renderer match the stored mesh.
#[test]
#[allow(clippy::expect_used)]
fn exported_buffers_match_meta() {
    load_files_internal(
        vec![UploadedFile::text(
            "board-F_Cu.gbr",
            include_str!("fixtures/kicad/board-F_Cu.gbr"),
        )],
        |_| {},
    );

    let meta = layer_mesh_internal("board-F_Cu.gbr")
        .expect("layer is known")
        .expect("layer has geometry");

    assert_eq!(get_positions().len(), meta.vertex_count as usize * 2);
    assert_eq!(get_indices().len(), meta.index_count as usize);
}
