//! Combined extent of the visible layers.

use crate::layers::{LayerInfo, VisibilityMap};

use super::types::BoundingBox;

/// Fold the bounds of every visible, parsed layer.
///
/// With nothing to fold the declared board outline
/// `{0, declared_width, 0, declared_height}` is returned instead.
pub fn aggregate(
    layers: &[LayerInfo],
    visibility: &VisibilityMap,
    declared_width: f64,
    declared_height: f64,
) -> BoundingBox {
    let mut combined = BoundingBox::new();

    for bounds in layers
        .iter()
        .filter(|layer| visibility.is_visible(layer))
        .filter_map(LayerInfo::bounds)
    {
        combined.merge(&bounds);
    }

    if combined.is_empty() {
        BoundingBox::from_extent(0.0, declared_width, 0.0, declared_height)
    } else {
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gerber::ParsedGerberData;
    use crate::layers::{Color, LayerRole};

    fn layer(name: &str, bounds: Option<BoundingBox>, visible: bool) -> LayerInfo {
        LayerInfo {
            name: name.to_string(),
            role: LayerRole::TopCopper,
            color: Color::rgb(0, 0, 0),
            visible,
            parsed: bounds.map(|bounds| ParsedGerberData {
                commands: Vec::new(),
                apertures: std::collections::BTreeMap::new(),
                bounds,
                declared_units: None,
                warnings: Vec::new(),
            }),
        }
    }

    #[test]
    fn empty_set_falls_back_to_declared_size() {
        let bounds = aggregate(&[], &VisibilityMap::new(), 80.0, 120.0);
        assert_eq!(bounds, BoundingBox::from_extent(0.0, 80.0, 0.0, 120.0));
    }

    #[test]
    fn parsed_geometry_wins_over_declared_size() {
        let layers = [layer(
            "top.gtl",
            Some(BoundingBox::from_extent(5.0, 25.0, 5.0, 25.0)),
            true,
        )];
        let bounds = aggregate(&layers, &VisibilityMap::new(), 100.0, 100.0);
        assert_eq!(bounds, BoundingBox::from_extent(5.0, 25.0, 5.0, 25.0));
    }

    #[test]
    fn hidden_layers_do_not_contribute() {
        let layers = [
            layer("top.gtl", Some(BoundingBox::from_extent(5.0, 25.0, 5.0, 25.0)), true),
            layer("big.gbl", Some(BoundingBox::from_extent(-50.0, 50.0, -50.0, 50.0)), false),
        ];
        let bounds = aggregate(&layers, &VisibilityMap::new(), 100.0, 100.0);
        assert_eq!(bounds, BoundingBox::from_extent(5.0, 25.0, 5.0, 25.0));
    }

    #[test]
    fn visibility_map_overrides_layer_flag() {
        let layers = [
            layer("top.gtl", Some(BoundingBox::from_extent(5.0, 25.0, 5.0, 25.0)), true),
            layer("big.gbl", Some(BoundingBox::from_extent(-50.0, 50.0, -50.0, 50.0)), true),
        ];
        let mut visibility = VisibilityMap::new();
        visibility.set("big.gbl", false);
        let bounds = aggregate(&layers, &visibility, 100.0, 100.0);
        assert_eq!(bounds, BoundingBox::from_extent(5.0, 25.0, 5.0, 25.0));
    }

    #[test]
    fn unparsed_layers_are_skipped() {
        let layers = [layer("board.drl", None, true)];
        let bounds = aggregate(&layers, &VisibilityMap::new(), 60.0, 40.0);
        assert_eq!(bounds, BoundingBox::from_extent(0.0, 60.0, 0.0, 40.0));
    }

    #[test]
    fn multiple_layers_are_unioned() {
        let layers = [
            layer("top.gtl", Some(BoundingBox::from_extent(0.0, 10.0, 2.0, 8.0)), true),
            layer("bot.gbl", Some(BoundingBox::from_extent(-4.0, 6.0, 0.0, 12.0)), true),
        ];
        let bounds = aggregate(&layers, &VisibilityMap::new(), 100.0, 100.0);
        assert_eq!(bounds, BoundingBox::from_extent(-4.0, 10.0, 0.0, 12.0));
    }
}
