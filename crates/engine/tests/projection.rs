//! Isometric transform, rotation and depth keys.

use cityblock_engine::grid::position::GRID_HALF;
use cityblock_engine::projection::{DepthKey, LAYER_H, Projection, ScreenPoint};
use cityblock_engine::view::Rotation;
use cityblock_engine::{CellPos, EngineError};

#[test]
fn origin_projects_to_canvas_center() {
    let p = Projection::new(480, 470);
    for rot in Rotation::ALL {
        assert_eq!(p.project(0, 0, 0, rot), ScreenPoint::new(240.0, 235.0));
    }
}

#[test]
fn forward_transform_matches_constants() {
    let p = Projection::new(480, 470);
    // (rx - ry) * 16, (rx + ry) * 8 - z * 20
    assert_eq!(p.project(1, 0, 0, Rotation::Deg0), ScreenPoint::new(256.0, 243.0));
    assert_eq!(p.project(0, 1, 0, Rotation::Deg0), ScreenPoint::new(224.0, 243.0));
    assert_eq!(p.project(0, 0, 2, Rotation::Deg0), ScreenPoint::new(240.0, 235.0 - 2.0 * LAYER_H));
    // 90: (x, y) -> (-y, x)
    assert_eq!(p.project(1, 0, 0, Rotation::Deg90), p.project(0, 1, 0, Rotation::Deg0));
}

#[test]
fn projection_round_trip_all_rotations() {
    let p = Projection::default();
    for rot in Rotation::ALL {
        for x in -GRID_HALF..=GRID_HALF {
            for y in -GRID_HALF..=GRID_HALF {
                let screen = p.project(x, y, 0, rot);
                assert_eq!(p.to_grid(screen, rot), Some((x, y)), "{rot:?} ({x},{y})");
            }
        }
    }
}

#[test]
fn to_grid_rounds_to_nearest_cell() {
    let p = Projection::default();
    let screen = p.project(2, -1, 0, Rotation::Deg180).offset(3.0, -2.0);
    assert_eq!(p.to_grid(screen, Rotation::Deg180), Some((2, -1)));
}

#[test]
fn non_finite_input_has_no_cell() {
    let p = Projection::default();
    assert_eq!(p.to_grid(ScreenPoint::new(f64::NAN, 0.0), Rotation::Deg0), None);
    assert_eq!(p.column_at(ScreenPoint::new(0.0, 0.0), Rotation::Deg0), None);
}

#[test]
fn four_quarter_turns_return_every_point() {
    let p = Projection::default();
    for x in -GRID_HALF..=GRID_HALF {
        for y in -GRID_HALF..=GRID_HALF {
            let start = p.project(x, y, 3, Rotation::Deg0);
            let mut rot = Rotation::Deg0;
            for _ in 0..4 {
                rot = rot.next();
            }
            assert_eq!(rot, Rotation::Deg0);
            assert_eq!(p.project(x, y, 3, rot), start);
        }
    }
}

#[test]
fn rotation_stepping_wraps() {
    assert_eq!(Rotation::Deg0.rotated_by(-90), Ok(Rotation::Deg270));
    assert_eq!(Rotation::Deg270.rotated_by(90), Ok(Rotation::Deg0));
    assert_eq!(Rotation::Deg90.rotated_by(360), Ok(Rotation::Deg90));
    assert_eq!(Rotation::Deg0.rotated_by(45), Err(EngineError::InvalidRotation(45)));
    assert_eq!(Rotation::from_degrees(-180), Ok(Rotation::Deg180));
}

#[test]
fn rotation_stepping_handles_extreme_deltas() {
    // 2_147_483_610 = 90 * 23_860_929, one quarter turn past a whole number of turns.
    assert_eq!(Rotation::Deg270.rotated_by(2_147_483_610), Ok(Rotation::Deg0));
    assert_eq!(Rotation::Deg90.rotated_by(-2_147_483_610), Ok(Rotation::Deg0));
    assert_eq!(Rotation::Deg90.rotated_by(i32::MIN), Err(EngineError::InvalidRotation(i32::MIN)));
}

#[test]
fn depth_key_orders_back_to_front() {
    let rot = Rotation::Deg0;
    let back = DepthKey::of(CellPos::new(-4, -4, 9), rot);
    let front = DepthKey::of(CellPos::new(0, -3, 0), rot);
    assert!(back < front, "z never crosses a diagonal");

    let low = DepthKey::of(CellPos::new(1, 1, 0), rot);
    let high = DepthKey::of(CellPos::new(1, 1, 1), rot);
    assert!(low < high);
    assert!(low < low.raised() && low.raised() < high);
}

#[test]
fn depth_sort_is_deterministic() {
    let cells: Vec<CellPos> = (-2..=2)
        .flat_map(|x| (-2..=2).flat_map(move |y| (0..3).map(move |z| CellPos::new(x, y, z))))
        .collect();
    for rot in Rotation::ALL {
        let sort = |mut v: Vec<CellPos>| {
            v.sort_by_key(|c| DepthKey::of(*c, rot));
            v
        };
        let first = sort(cells.clone());
        let mut reversed = cells.clone();
        reversed.reverse();
        let second = sort(reversed);
        let keys = |v: &[CellPos]| v.iter().map(|c| DepthKey::of(*c, rot)).collect::<Vec<_>>();
        assert_eq!(keys(&first), keys(&second));
        assert!(keys(&first).windows(2).all(|w| w[0] <= w[1]));
    }
}
