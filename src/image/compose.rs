//! Comparison sheet: each input next to the image the model produced from it.

use image::{imageops, Rgba, RgbaImage};

use crate::error::{Error, Result};

/// Fill between cells.
pub const GUTTER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Lay out `(input, output)` pairs as rows, input left, output right.
///
/// Cells take the size of the largest image in their column; smaller images
/// sit in the top-left corner of their cell. `gutter` pixels separate cells
/// and surround the sheet.
///
/// # Errors
///
/// Returns an error if the sheet dimensions do not fit in `u32`.
pub fn side_by_side(pairs: &[(RgbaImage, RgbaImage)], gutter: u32) -> Result<RgbaImage> {
    let left_width = pairs.iter().map(|(i, _)| i.width()).max().unwrap_or(0);
    let right_width = pairs.iter().map(|(_, o)| o.width()).max().unwrap_or(0);
    let row_heights: Vec<u32> = pairs
        .iter()
        .map(|(i, o)| i.height().max(o.height()))
        .collect();

    let (width, height) = sheet_size(left_width, right_width, &row_heights, gutter)
        .ok_or_else(|| {
            Error::invalid("gutter", format!("sheet with gutter {gutter} is too large"))
        })?;

    let mut sheet = RgbaImage::from_pixel(width, height, GUTTER_COLOR);

    // Offsets below stay within the checked sheet size
    let mut y = gutter;
    for ((input, output), row_height) in pairs.iter().zip(&row_heights) {
        imageops::replace(&mut sheet, input, i64::from(gutter), i64::from(y));
        imageops::replace(
            &mut sheet,
            output,
            i64::from(left_width) + i64::from(gutter) * 2,
            i64::from(y),
        );
        y = y.saturating_add(*row_height).saturating_add(gutter);
    }

    Ok(sheet)
}

fn sheet_size(
    left_width: u32,
    right_width: u32,
    row_heights: &[u32],
    gutter: u32,
) -> Option<(u32, u32)> {
    let rows = u32::try_from(row_heights.len()).ok()?;

    let width = left_width
        .checked_add(right_width)?
        .checked_add(gutter.checked_mul(3)?)?;
    let height = row_heights
        .iter()
        .try_fold(0u32, |acc, &h| acc.checked_add(h))?
        .checked_add(gutter.checked_mul(rows.checked_add(1)?)?)?;

    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_layout() {
        let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        let pairs = vec![(red.clone(), blue.clone()), (blue, red)];

        let sheet = side_by_side(&pairs, 2).unwrap();

        assert_eq!(sheet.dimensions(), (4 + 4 + 6, 4 + 4 + 6));
        assert_eq!(*sheet.get_pixel(0, 0), GUTTER_COLOR);
        assert_eq!(sheet.get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(sheet.get_pixel(8, 2).0, [0, 0, 255, 255]);
        assert_eq!(sheet.get_pixel(2, 8).0, [0, 0, 255, 255]);
        assert_eq!(sheet.get_pixel(8, 8).0, [255, 0, 0, 255]);
        assert_eq!(*sheet.get_pixel(7, 2), GUTTER_COLOR);
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = side_by_side(&[], 3).unwrap();
        assert_eq!(sheet.dimensions(), (9, 3));
    }

    #[test]
    fn test_no_gutter() {
        let a = RgbaImage::from_pixel(2, 3, Rgba([1, 2, 3, 255]));
        let b = RgbaImage::from_pixel(5, 1, Rgba([4, 5, 6, 255]));
        let sheet = side_by_side(&[(a, b)], 0).unwrap();
        assert_eq!(sheet.dimensions(), (7, 3));
    }

    #[test]
    fn test_oversized_gutter_is_an_error() {
        let a = RgbaImage::new(8, 8);
        let b = RgbaImage::new(8, 8);

        let err = side_by_side(&[(a, b)], u32::MAX / 2).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }
}
