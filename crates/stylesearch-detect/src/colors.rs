//! Coarse color naming and per-category style tags for detected items.

use image::DynamicImage;

use stylesearch_core::Category;

/// Name the dominant color of an image by its mean RGB value.
pub fn dominant_colors(image: &DynamicImage) -> Vec<String> {
    let rgb = image.thumbnail(32, 32).to_rgb8();
    let n = (rgb.width() * rgb.height()).max(1) as u64;
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for pixel in rgb.pixels() {
        r += u64::from(pixel.0[0]);
        g += u64::from(pixel.0[1]);
        b += u64::from(pixel.0[2]);
    }
    vec![name_color((r / n) as u8, (g / n) as u8, (b / n) as u8).to_string()]
}

fn name_color(r: u8, g: u8, b: u8) -> &'static str {
    if r > 200 && g > 200 && b > 200 {
        "white"
    } else if r < 50 && g < 50 && b < 50 {
        "black"
    } else if r > 150 && g > 150 && b < 100 {
        "yellow"
    } else if r > 150 && g < 100 && b < 100 {
        "red"
    } else if g > 150 && r < 100 && b < 100 {
        "green"
    } else if b > 150 && r < 100 && g < 100 {
        "blue"
    } else if r.abs_diff(g) < 30 && g.abs_diff(b) < 30 {
        "gray"
    } else {
        "multicolor"
    }
}

/// Generic style descriptors attached to a region by category.
pub fn style_tags_for(category: Category) -> Vec<String> {
    let tags: &[&str] = match category {
        Category::Clothing => &["apparel", "casual"],
        Category::Shoes => &["footwear"],
        Category::Bags => &["carry", "accessory"],
        Category::Accessories => &["accessory"],
        Category::Unknown => &[],
    };
    tags.iter().map(|t| (*t).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        let mut img = RgbImage::new(16, 16);
        for pixel in img.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn names_primary_colors() {
        assert_eq!(dominant_colors(&solid(230, 230, 230)), vec!["white"]);
        assert_eq!(dominant_colors(&solid(20, 20, 20)), vec!["black"]);
        assert_eq!(dominant_colors(&solid(200, 40, 40)), vec!["red"]);
        assert_eq!(dominant_colors(&solid(40, 40, 200)), vec!["blue"]);
        assert_eq!(dominant_colors(&solid(128, 128, 128)), vec!["gray"]);
    }

    #[test]
    fn unknown_category_has_no_tags() {
        assert!(style_tags_for(Category::Unknown).is_empty());
    }
}
