use image::GrayImage;
use nanorand::{Rng, WyRand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// Occupied-pixel counts with a zero row and column in front, so the table
/// is `(width + 1) * (height + 1)` and any region sum takes four lookups.
///
/// https://blog.demofox.org/2018/04/16/prefix-sums-and-summed-area-tables/
pub struct SummedAreaTable {
    width: u32,
    height: u32,
    table: Vec<u32>,
}

impl SummedAreaTable {
    pub fn new(width: u32, height: u32) -> Self {
        SummedAreaTable {
            width,
            height,
            table: vec![0; (width as usize + 1) * (height as usize + 1)],
        }
    }

    pub fn from_occupancy(occupancy: &GrayImage) -> Self {
        let mut table = Self::new(occupancy.width(), occupancy.height());
        table.update_from_row(occupancy, 0);
        table
    }

    fn stride(&self) -> usize {
        self.width as usize + 1
    }

    /// Recomputes every row from `start_row` down. Rows above it are kept.
    pub fn update_from_row(&mut self, occupancy: &GrayImage, start_row: u32) {
        let stride = self.stride();
        let width = self.width as usize;
        let raw = occupancy.as_raw();

        for y in start_row as usize..self.height as usize {
            let mut row_sum = 0;
            for x in 0..width {
                if raw[y * width + x] != 0 {
                    row_sum += 1;
                }
                let above = self.table[y * stride + x + 1];
                self.table[(y + 1) * stride + x + 1] = above + row_sum;
            }
        }
    }

    pub fn region_is_empty(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        let stride = self.stride();
        let (x, y, width, height) = (x as usize, y as usize, width as usize, height as usize);

        let tl = self.table[y * stride + x];
        let tr = self.table[y * stride + x + width];
        let bl = self.table[(y + height) * stride + x];
        let br = self.table[(y + height) * stride + x + width];

        br + tl - tr - bl == 0
    }

    /// 在图片寻找位置写字
    ///
    /// Picks uniformly among every free position for `rect`.
    pub fn find_space_for_rect(&self, rect: &Rect, rng: &mut WyRand) -> Option<Point> {
        if rect.width == 0
            || rect.height == 0
            || rect.width > self.width
            || rect.height > self.height
        {
            return None;
        }

        let available_points = self.free_positions(*rect).count();
        if available_points == 0 {
            return None;
        }

        let pick = rng.generate_range(0..available_points);
        self.free_positions(*rect).nth(pick)
    }

    fn free_positions(&self, rect: Rect) -> impl Iterator<Item = Point> + '_ {
        let max_x = self.width - rect.width;
        let max_y = self.height - rect.height;

        // row by row
        (0..=max_y)
            .flat_map(move |y| (0..=max_x).map(move |x| Point { x, y }))
            .filter(move |p| self.region_is_empty(p.x, p.y, rect.width, rect.height))
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn occupancy(width: u32, height: u32, filled: &[(u32, u32)]) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for (x, y) in filled {
            img.put_pixel(*x, *y, Luma([1]));
        }
        img
    }

    #[test]
    fn empty_table_has_room_everywhere() {
        let table = SummedAreaTable::from_occupancy(&occupancy(4, 3, &[]));
        assert!(table.region_is_empty(0, 0, 4, 3));
        assert!(table.region_is_empty(3, 2, 1, 1));
    }

    #[test]
    fn detects_occupied_regions() {
        let table = SummedAreaTable::from_occupancy(&occupancy(4, 4, &[(2, 1)]));
        assert!(!table.region_is_empty(0, 0, 4, 4));
        assert!(!table.region_is_empty(2, 1, 1, 1));
        assert!(table.region_is_empty(0, 0, 2, 4));
        assert!(table.region_is_empty(0, 2, 4, 2));
    }

    #[test]
    fn partial_update_matches_full_rebuild() {
        let mut img = occupancy(5, 5, &[(0, 0)]);
        let mut table = SummedAreaTable::from_occupancy(&img);

        img.put_pixel(3, 3, Luma([1]));
        img.put_pixel(4, 4, Luma([1]));
        table.update_from_row(&img, 3);

        let rebuilt = SummedAreaTable::from_occupancy(&img);
        assert_eq!(table.table, rebuilt.table);
    }

    #[test]
    fn finds_the_only_free_spot() {
        let mut filled = vec![];
        for y in 0..3 {
            for x in 0..3 {
                if (x, y) != (2, 2) {
                    filled.push((x, y));
                }
            }
        }
        let table = SummedAreaTable::from_occupancy(&occupancy(3, 3, &filled));
        let mut rng = WyRand::new_seed(7);

        let rect = Rect { width: 1, height: 1 };
        assert_eq!(table.find_space_for_rect(&rect, &mut rng), Some(Point { x: 2, y: 2 }));
        assert_eq!(table.find_space_for_rect(&Rect { width: 2, height: 1 }, &mut rng), None);
    }

    #[test]
    fn oversized_rect_never_fits() {
        let table = SummedAreaTable::new(10, 10);
        let mut rng = WyRand::new_seed(1);
        assert_eq!(table.find_space_for_rect(&Rect { width: 11, height: 1 }, &mut rng), None);
        assert_eq!(
            table.find_space_for_rect(&Rect { width: 10, height: 10 }, &mut rng),
            Some(Point { x: 0, y: 0 })
        );
    }
}
