//! Shared fixture: a small video-game sales warehouse.
//!
//! * `base_sales` holds raw rows and both service keys.
//! * `g_by_y` and `g_by_y_ym` are rollups by year and by year + yearmonth.
//! * `dim_game` and `dim_publisher` are joined through `sk_id_game` / `sk_id_publisher`.

#![allow(dead_code)]

use olap::schema::{DataField, DataTable, DimensionField, DimensionTable, SchemaCollection};
use olap::Calculation;

pub const BASE_SALES: &str = "olap_test.games_olap.base_sales";
pub const G_BY_Y: &str = "olap_test.games_olap.g_by_y";
pub const G_BY_Y_YM: &str = "olap_test.games_olap.g_by_y_ym";
pub const DIM_GAME: &str = "olap_test.games_olap.dim_game";
pub const DIM_PUBLISHER: &str = "olap_test.games_olap.dim_publisher";

pub fn base_sales() -> DataTable {
    let mut table = DataTable::new(BASE_SALES).as_base_table();
    for field in [
        DataField::dimension("year", "year", "Year").with_data_type("int"),
        DataField::dimension("yearmonth", "yearmonth", "Year and month"),
        DataField::service_key("sk_id_game", "sk_id_game"),
        DataField::service_key("sk_id_publisher", "sk_id_publisher"),
        DataField::value("pcs", "pcs", "Pieces sold").with_data_type("int"),
        DataField::value("price", "price", "Price"),
        DataField::value("sales_rub", "sales_rub", "Sales, RUB"),
        DataField::value("achievements", "achievements", "Achievements"),
    ] {
        table.add_field(field).unwrap();
    }
    table
}

pub fn g_by_y() -> DataTable {
    let mut table = DataTable::new(G_BY_Y);
    for field in [
        DataField::dimension("year", "year", "Year"),
        DataField::calculated("pcs", "pcs", Calculation::Sum, Some(Calculation::Sum)),
        DataField::calculated(
            "sales_rub",
            "sales_rub",
            Calculation::Sum,
            Some(Calculation::Sum),
        ),
        DataField::calculated("price", "price", Calculation::Avg, None),
    ] {
        table.add_field(field).unwrap();
    }
    table
}

pub fn g_by_y_ym() -> DataTable {
    let mut table = DataTable::new(G_BY_Y_YM);
    for field in [
        DataField::dimension("year", "year", "Year"),
        DataField::dimension("yearmonth", "yearmonth", "Year and month"),
        DataField::calculated("pcs", "pcs", Calculation::Sum, Some(Calculation::Sum)),
        DataField::calculated(
            "sales_rub",
            "sales_rub",
            Calculation::Sum,
            Some(Calculation::Sum),
        ),
        DataField::calculated("price", "price", Calculation::Avg, None),
    ] {
        table.add_field(field).unwrap();
    }
    table
}

pub fn dim_game() -> DimensionTable {
    let mut table = DimensionTable::new(DIM_GAME);
    table
        .add_field(DimensionField::service_key("sk_id_game", "sk_id_game"))
        .unwrap();
    table
        .add_field(DimensionField::dimension("bk_game_id", "bk_id_game", "Game id").with_sk_for_count(true))
        .unwrap();
    table
        .add_field(DimensionField::dimension("game_name", "game_name", "Game"))
        .unwrap();
    table
}

pub fn dim_publisher() -> DimensionTable {
    let mut table = DimensionTable::new(DIM_PUBLISHER);
    table
        .add_field(DimensionField::service_key("sk_id_publisher", "sk_id_publisher"))
        .unwrap();
    table
        .add_field(DimensionField::dimension(
            "publisher_name",
            "publisher_name",
            "Publisher",
        ))
        .unwrap();
    table
}

pub fn games_schema() -> SchemaCollection {
    let mut schema = SchemaCollection::new();
    schema.add_dimension_table(dim_game()).unwrap();
    schema.add_dimension_table(dim_publisher()).unwrap();
    schema.add_data_table(base_sales()).unwrap();
    schema.add_data_table(g_by_y()).unwrap();
    schema.add_data_table(g_by_y_ym()).unwrap();
    schema
}
