use super::PrimitiveSpec;

const fn shape(name: &'static str, parameters: &'static [&'static str], resolution: bool) -> PrimitiveSpec {
    PrimitiveSpec {
        name,
        parameters,
        resolution,
        takes_children: false,
    }
}

const fn operation(
    name: &'static str,
    parameters: &'static [&'static str],
    resolution: bool,
) -> PrimitiveSpec {
    PrimitiveSpec {
        name,
        parameters,
        resolution,
        takes_children: true,
    }
}

/// Geometry, boolean and transform modules.
pub static PRIMITIVES: [PrimitiveSpec; 21] = [
    // 3D
    shape("cube", &["size", "center"], false),
    shape("sphere", &["r", "d"], true),
    shape(
        "cylinder",
        &["h", "r1", "r2", "center", "r", "d", "d1", "d2"],
        true,
    ),
    shape("polyhedron", &["points", "faces", "convexity"], false),
    // 2D
    shape("square", &["size", "center"], false),
    shape("circle", &["r", "d"], true),
    shape("polygon", &["points", "paths", "convexity"], false),
    // Booleans
    operation("union", &[], false),
    operation("difference", &[], false),
    operation("intersection", &[], false),
    operation("hull", &[], false),
    operation("minkowski", &["convexity"], false),
    // Transforms
    operation("translate", &["v"], false),
    operation("rotate", &["a", "v"], false),
    operation("scale", &["v"], false),
    operation("mirror", &["v"], false),
    operation("multmatrix", &["m"], false),
    operation("color", &["c", "alpha"], false),
    // Extrusion
    operation(
        "linear_extrude",
        &["height", "center", "convexity", "twist", "slices", "scale"],
        true,
    ),
    operation("rotate_extrude", &["angle", "convexity"], true),
    operation("render", &["convexity"], false),
];
