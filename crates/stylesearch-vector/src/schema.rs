use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow schema of the products table. List-valued and open-ended fields
/// (colors, style_tags, metadata) are stored as JSON text columns.
pub fn build_products_schema(dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("product_id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("brand", DataType::Utf8, true),
        Field::new("description", DataType::Utf8, true),
        Field::new("category", DataType::Utf8, false),
        Field::new("subcategory", DataType::Utf8, false),
        Field::new("price", DataType::Float64, false),
        Field::new("currency", DataType::Utf8, false),
        Field::new("colors", DataType::Utf8, false),
        Field::new("style_tags", DataType::Utf8, false),
        Field::new("image_url", DataType::Utf8, true),
        Field::new("in_stock", DataType::Boolean, false),
        Field::new("source_category", DataType::Utf8, true),
        Field::new("category_corrected", DataType::Boolean, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dim as i32,
            ),
            true,
        ),
    ]))
}
