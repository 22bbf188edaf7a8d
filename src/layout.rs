//! Compiled-in coordinate table for the menu template.

use image::Rgb;

/// One named region of the board and the pixel rows of its line slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    pub name: &'static str,
    pub rows: &'static [u32],
}

pub const SECTIONS: &[SectionLayout] = &[
    SectionLayout {
        name: "Pães Macios Tradicionais",
        rows: &[233, 270, 307, 344],
    },
    SectionLayout {
        name: "Pães Italianos e Rústicos",
        rows: &[425, 462, 499, 536, 572],
    },
    SectionLayout {
        name: "Pão Francês",
        rows: &[657, 693, 729, 764],
    },
    SectionLayout {
        name: "Pães Doces e Macios",
        rows: &[855, 892, 927],
    },
    SectionLayout {
        name: "Bolos e Tortas",
        rows: &[1018, 1055, 1090, 1126, 1161],
    },
    SectionLayout {
        name: "Doces",
        rows: &[1242, 1278, 1314, 1349],
    },
    SectionLayout {
        name: "Salgados",
        rows: &[1440, 1476, 1512, 1548],
    },
];

pub const DATE_ANCHOR: (i32, i32) = (275, 125);
pub const PRODUCT_X: i32 = 40;
pub const PRICE_X: i32 = 670;
/// Added to each slot row before drawing entry text.
pub const ROW_OFFSET: i32 = 4;

pub const ENTRY_FONT_PX: f32 = 26.0;
pub const DATE_FONT_PX: f32 = 36.0;

/// #3e2723
pub const TEXT_COLOR: Rgb<u8> = Rgb([0x3e, 0x27, 0x23]);

pub fn section(name: &str) -> Option<&'static SectionLayout> {
    SECTIONS.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_strictly_increasing() {
        let mut last = 0;
        for section in SECTIONS {
            for &y in section.rows {
                assert!(y > last, "{} row {} not after {}", section.name, y, last);
                last = y;
            }
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(section("Pães Doces e Macios").unwrap().rows, &[855, 892, 927]);
        assert!(section("Pizzas").is_none());
    }
}
