/// Arrow schema definitions for resale artifacts.
pub mod resale {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Schema for a normalized resale batch.
    pub fn normalized_schema() -> Schema {
        Schema::new(normalized_fields())
    }

    /// Schema for a geocoded resale batch: the normalized columns plus coordinates.
    pub fn geocoded_schema() -> Schema {
        let mut fields = normalized_fields();
        fields.push(Field::new("latitude", DataType::Float64, true));
        fields.push(Field::new("longitude", DataType::Float64, true));
        Schema::new(fields)
    }

    fn normalized_fields() -> Vec<Field> {
        vec![
            Field::new("month", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("town", DataType::Utf8, true),
            Field::new("flat_type", DataType::Utf8, true),
            Field::new("storey_range", DataType::Utf8, true),
            Field::new("floor_area_sqm", DataType::Float64, true),
            Field::new("flat_model", DataType::Utf8, true),
            Field::new("lease_commence_date", DataType::Int32, true),
            Field::new("remaining_lease", DataType::Int32, true),
            Field::new("resale_price", DataType::Int64, false),
            Field::new("full_address", DataType::Utf8, false),
            Field::new("search_address", DataType::Utf8, false),
        ]
    }
}
