// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build a small tree and export its subdivision as SVG rectangles.
//!
//! Run with `RUST_LOG=understory_quadtree=trace` to see subdivisions and
//! rejected inserts as they happen.

use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use understory_quadtree::{BoundingBox, Cell, QuadTree, QuadTreeConfig};

fn svg_rect(cell: &Cell) -> String {
    let r: Rect = cell.bounds.into();
    let stroke = if cell.is_leaf { "black" } else { "gray" };
    format!(
        r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{stroke}" data-depth="{}" data-len="{}"/>"#,
        r.x0,
        r.y0,
        r.width(),
        r.height(),
        cell.depth,
        cell.len,
    )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let bounds = BoundingBox::new(Point::new(0.0, 0.0), Point::new(256.0, 256.0));
    let config = QuadTreeConfig::new().with_capacity(2).with_max_depth(5);
    let mut tree = QuadTree::with_config(bounds, config);

    let mut rejected = 0;
    for i in 0..64_u32 {
        // A spiral that gets denser towards the center.
        let t = f64::from(i) * 0.35;
        let radius = 4.0 * t;
        let p = Point::new(128.0 + radius * t.cos(), 128.0 + radius * t.sin());
        if let Err(err) = tree.insert(i, p) {
            eprintln!("skipping {i}: {err}");
            rejected += 1;
        }
    }

    println!(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 256 256">"#);
    tree.visit_cells(|cell| println!("{}", svg_rect(&cell)));
    for (id, p) in tree.iter() {
        println!(r#"  <circle cx="{}" cy="{}" r="1.5" data-id="{id}"/>"#, p.x, p.y);
    }
    println!("</svg>");

    eprintln!(
        "{} entries stored, {rejected} rejected, {} cells",
        tree.len(),
        tree.cells().len()
    );
    if let Some(id) = tree.nearest(Point::new(0.0, 0.0)) {
        eprintln!("closest to the origin: {id}");
    }
}
