use crate::models::point::{Offset, Point};

/// Lay fields out on one row of a column grid.
///
/// Each `(name, column)` lands at `anchor + (column_width * column, row_offset)`.
pub fn grid_layout<S: AsRef<str>>(
    anchor: Point,
    column_width: i32,
    row_offset: i32,
    fields: &[(S, u32)],
) -> Vec<(String, Point)> {
    fields
        .iter()
        .map(|(name, column)| {
            let offset = Offset::new(column_width * *column as i32, row_offset);
            (name.as_ref().to_string(), anchor.offset(offset))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout_columns() {
        let points = grid_layout(Point::new(400, 300), 150, 30, &[("a", 1), ("b", 3)]);

        assert_eq!(
            points,
            vec![
                ("a".to_string(), Point::new(550, 330)),
                ("b".to_string(), Point::new(850, 330)),
            ]
        );
    }

    #[test]
    fn test_column_zero_sits_below_anchor() {
        let points = grid_layout(Point::new(10, 10), 80, 25, &[("genus", 0)]);
        assert_eq!(points[0].1, Point::new(10, 35));
    }

    #[test]
    fn test_negative_row_offset() {
        let points = grid_layout(Point::new(100, 100), 50, -20, &[("x".to_string(), 2)]);
        assert_eq!(points[0].1, Point::new(200, 80));
    }

    #[test]
    fn test_empty_field_list() {
        let fields: [(&str, u32); 0] = [];
        assert!(grid_layout(Point::new(0, 0), 10, 10, &fields).is_empty());
    }
}
