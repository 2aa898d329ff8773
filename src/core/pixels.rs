//! Pixel pages
//!
//! Contiguous row-major storage of pixel attributes for one video page.
//! Every accessor clips against the page: reads outside return 0 and writes
//! outside are dropped. Rectangles are inclusive on both corners, matching
//! the coordinates of BASIC's graphics statements.

use serde::{Deserialize, Serialize};

/// An inclusive pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Rect {
    /// Build a rectangle from two corners in any order
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Rectangle of `width` x `height` pixels with its top left corner at
    /// (x, y). Corners past the coordinate range saturate; `None` when
    /// either side is empty.
    pub fn sized(x: usize, y: usize, width: usize, height: usize) -> Option<Self> {
        (width > 0 && height > 0).then(|| Self {
            x0: x,
            y0: y,
            x1: x.saturating_add(width - 1),
            y1: y.saturating_add(height - 1),
        })
    }

    pub fn width(&self) -> usize {
        (self.x1 - self.x0).saturating_add(1)
    }

    pub fn height(&self) -> usize {
        (self.y1 - self.y0).saturating_add(1)
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }

    /// Overlap of two rectangles
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        (x0 <= x1 && y0 <= y1).then_some(Rect { x0, y0, x1, y1 })
    }
}

/// One page of pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelPage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelPage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The whole page as a rectangle; `None` for an empty page
    pub fn bounds(&self) -> Option<Rect> {
        (self.width > 0 && self.height > 0)
            .then(|| Rect::new(0, 0, self.width - 1, self.height - 1))
    }

    /// Part of `rect` that lies on the page
    pub fn clip(&self, rect: Rect) -> Option<Rect> {
        self.bounds().and_then(|b| b.intersect(&rect))
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[y * self.width + x]
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, attr: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = attr;
        }
    }

    /// `len` pixels of row `y` starting at `x`; zero past the edge
    pub fn get_interval(&self, x: usize, y: usize, len: usize) -> Vec<u8> {
        let mut out = vec![0; len];
        if y < self.height && x < self.width {
            let n = len.min(self.width - x);
            let start = y * self.width + x;
            out[..n].copy_from_slice(&self.data[start..start + n]);
        }
        out
    }

    pub fn put_interval(&mut self, x: usize, y: usize, colours: &[u8]) {
        if y >= self.height || x >= self.width {
            return;
        }
        let n = colours.len().min(self.width - x);
        let start = y * self.width + x;
        self.data[start..start + n].copy_from_slice(&colours[..n]);
    }

    /// Fill pixels `x0..=x1` of row `y`
    pub fn fill_interval(&mut self, x0: usize, x1: usize, y: usize, attr: u8) {
        if y >= self.height || x0 >= self.width || x0 > x1 {
            return;
        }
        let x1 = x1.min(self.width - 1);
        let row = y * self.width;
        self.data[row + x0..=row + x1].fill(attr);
    }

    /// Rows of the rectangle; pixels outside the page read as zero
    pub fn get_rect(&self, rect: Rect) -> Vec<Vec<u8>> {
        (rect.y0..=rect.y1)
            .map(|y| self.get_interval(rect.x0, y, rect.width()))
            .collect()
    }

    /// Write rows of pixels with the top-left corner at (x0, y0)
    pub fn put_rect(&mut self, x0: usize, y0: usize, rows: &[Vec<u8>]) {
        for (dy, row) in rows.iter().enumerate() {
            self.put_interval(x0, y0.saturating_add(dy), row);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, attr: u8) {
        let Some(rect) = self.clip(rect) else {
            return;
        };
        for y in rect.y0..=rect.y1 {
            self.fill_interval(rect.x0, rect.x1, y, attr);
        }
    }

    /// Copy the pixels of `src` so that its top-left corner lands on
    /// (dst_x, dst_y). Overlapping source and destination are handled.
    pub fn move_rect(&mut self, src: Rect, dst_x: usize, dst_y: usize) {
        let rows = self.get_rect(src);
        self.put_rect(dst_x, dst_y, &rows);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self, attr: u8) {
        self.data.fill(attr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalises_corners() {
        let rect = Rect::new(10, 8, 2, 3);
        assert_eq!(rect, Rect { x0: 2, y0: 3, x1: 10, y1: 8 });
        assert_eq!(rect.width(), 9);
        assert_eq!(rect.height(), 6);
        assert!(rect.contains(2, 8));
        assert!(!rect.contains(11, 8));
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new(0, 0, 9, 9);
        let b = Rect::new(5, 5, 20, 20);
        assert_eq!(a.intersect(&b), Some(Rect::new(5, 5, 9, 9)));
        assert_eq!(a.intersect(&Rect::new(10, 0, 12, 3)), None);
    }

    #[test]
    fn test_sized_rect_saturates() {
        assert_eq!(Rect::sized(3, 4, 2, 1), Some(Rect::new(3, 4, 4, 4)));
        assert_eq!(Rect::sized(3, 4, 0, 1), None);
        let far = Rect::sized(usize::MAX - 1, 0, 5, 1).unwrap();
        assert_eq!(far.x1, usize::MAX);
        assert_eq!(Rect::new(0, 0, usize::MAX, 0).width(), usize::MAX);
        assert_eq!(PixelPage::new(4, 2).clip(far), None);
    }

    #[test]
    fn test_pixel_out_of_range() {
        let mut page = PixelPage::new(4, 2);
        page.put_pixel(4, 0, 3);
        page.put_pixel(0, 2, 3);
        assert!(page.data().iter().all(|&p| p == 0));
        assert_eq!(page.get_pixel(100, 100), 0);
    }

    #[test]
    fn test_interval_clips() {
        let mut page = PixelPage::new(4, 2);
        page.put_interval(2, 1, &[1, 2, 3, 4]);
        assert_eq!(page.get_interval(0, 1, 6), vec![0, 0, 1, 2, 0, 0]);
        page.fill_interval(1, 99, 0, 5);
        assert_eq!(page.get_interval(0, 0, 4), vec![0, 5, 5, 5]);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut page = PixelPage::new(4, 4);
        page.fill_rect(Rect::new(2, 2, 10, 10), 1);
        assert_eq!(page.get_rect(Rect::new(0, 0, 3, 3)), vec![
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 1, 1],
            vec![0, 0, 1, 1],
        ]);
    }

    #[test]
    fn test_move_rect_overlapping() {
        let mut page = PixelPage::new(3, 4);
        for y in 0..4 {
            page.fill_interval(0, 2, y, y as u8 + 1);
        }
        page.move_rect(Rect::new(0, 1, 2, 3), 0, 0);
        assert_eq!(page.get_interval(0, 0, 3), vec![2, 2, 2]);
        assert_eq!(page.get_interval(0, 2, 3), vec![4, 4, 4]);
        assert_eq!(page.get_interval(0, 3, 3), vec![4, 4, 4]);
    }
}
