// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform cell grid over the padded viewport.

use kurbo::{Circle, Rect};

use crate::types::{EntryKey, GroupFilter};

/// Target cell edge length in pixels.
const CELL_SIZE: f64 = 25.0;

/// Screen-space grid of accepted boxes and circles.
///
/// Entries are bucketed into fixed-size cells so a hit test only scans the
/// cells the query geometry touches. The grid never removes entries; it lives
/// exactly as long as one placement pass.
#[derive(Debug)]
pub struct GridIndex {
    width: f64,
    height: f64,
    x_cells: usize,
    y_cells: usize,
    boxes: Vec<(EntryKey, Rect)>,
    circles: Vec<(EntryKey, Circle)>,
    box_cells: Vec<Vec<u32>>,
    circle_cells: Vec<Vec<u32>>,
}

impl GridIndex {
    /// Creates an empty grid covering `width × height` pixels.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let x_cells = ((width / CELL_SIZE).ceil() as usize).max(1);
        let y_cells = ((height / CELL_SIZE).ceil() as usize).max(1);
        Self {
            width,
            height,
            x_cells,
            y_cells,
            boxes: Vec::new(),
            circles: Vec::new(),
            box_cells: vec![Vec::new(); x_cells * y_cells],
            circle_cells: vec![Vec::new(); x_cells * y_cells],
        }
    }

    /// Number of boxes inserted so far.
    #[must_use]
    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Number of circles inserted so far.
    #[must_use]
    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    /// Inserts a box with its entry tag.
    pub fn insert_box(&mut self, key: EntryKey, rect: Rect) {
        let index = self.boxes.len() as u32;
        self.boxes.push((key, rect));
        let (x0, x1, y0, y1) = self.cell_span(&rect);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.box_cells[y * self.x_cells + x].push(index);
            }
        }
    }

    /// Inserts a circle with its entry tag.
    pub fn insert_circle(&mut self, key: EntryKey, circle: Circle) {
        let index = self.circles.len() as u32;
        let bounds = circle_bounds(&circle);
        self.circles.push((key, circle));
        let (x0, x1, y0, y1) = self.cell_span(&bounds);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.circle_cells[y * self.x_cells + x].push(index);
            }
        }
    }

    /// Whether any matching entry overlaps `rect`. Early-exits on the first
    /// obstruction.
    #[must_use]
    pub fn hit_test_box(&self, rect: &Rect, filter: GroupFilter) -> bool {
        let (x0, x1, y0, y1) = self.cell_span(rect);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let cell = y * self.x_cells + x;
                for &i in &self.box_cells[cell] {
                    let (key, other) = &self.boxes[i as usize];
                    if key.matches(filter) && rects_overlap(rect, other) {
                        return true;
                    }
                }
                for &i in &self.circle_cells[cell] {
                    let (key, other) = &self.circles[i as usize];
                    if key.matches(filter) && circle_rect_overlap(other, rect) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Whether any matching entry overlaps `circle`.
    #[must_use]
    pub fn hit_test_circle(&self, circle: &Circle, filter: GroupFilter) -> bool {
        let bounds = circle_bounds(circle);
        let (x0, x1, y0, y1) = self.cell_span(&bounds);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let cell = y * self.x_cells + x;
                for &i in &self.box_cells[cell] {
                    let (key, other) = &self.boxes[i as usize];
                    if key.matches(filter) && circle_rect_overlap(circle, other) {
                        return true;
                    }
                }
                for &i in &self.circle_cells[cell] {
                    let (key, other) = &self.circles[i as usize];
                    if key.matches(filter) && circles_overlap(circle, other) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn cell_span(&self, rect: &Rect) -> (usize, usize, usize, usize) {
        let clamp_x = |v: f64| ((v / self.width * self.x_cells as f64) as isize)
            .clamp(0, self.x_cells as isize - 1) as usize;
        let clamp_y = |v: f64| ((v / self.height * self.y_cells as f64) as isize)
            .clamp(0, self.y_cells as isize - 1) as usize;
        (clamp_x(rect.x0), clamp_x(rect.x1), clamp_y(rect.y0), clamp_y(rect.y1))
    }
}

fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

fn circle_bounds(circle: &Circle) -> Rect {
    Rect::new(
        circle.center.x - circle.radius,
        circle.center.y - circle.radius,
        circle.center.x + circle.radius,
        circle.center.y + circle.radius,
    )
}

fn circles_overlap(a: &Circle, b: &Circle) -> bool {
    let dx = a.center.x - b.center.x;
    let dy = a.center.y - b.center.y;
    let reach = a.radius + b.radius;
    dx * dx + dy * dy < reach * reach
}

fn circle_rect_overlap(circle: &Circle, rect: &Rect) -> bool {
    let nearest_x = circle.center.x.clamp(rect.x0, rect.x1);
    let nearest_y = circle.center.y.clamp(rect.y0, rect.y1);
    let dx = circle.center.x - nearest_x;
    let dy = circle.center.y - nearest_y;
    dx * dx + dy * dy < circle.radius * circle.radius
}
