use std::io::Write;

use refill::status::Silent;
use refill::{RefillCandidate, RefillConfig, RefillError, Upload};

fn candidate(item: &str, color: &str, warehouse: f64, sales: f64) -> RefillCandidate {
    RefillCandidate {
        item_code: item.into(),
        color_code: color.into(),
        total_warehouse_stock: warehouse,
        total_sales_stock: sales,
    }
}

#[test]
fn csv_file_on_disk() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(
        file,
        "Branch stock,,,\n\
         ,,,\n\
         ITEM CODE,COLOR CODE,FWareHouseStock,Sales Stock\n\
         T100,BLK,\"1,200\",2\n\
         T100,BLK,-4,1\n\
         T200,WHT,3,7\n\
         T300,,5,0\n"
    )
    .unwrap();

    let upload = Upload::from_path(file.path()).unwrap();
    let report = refill::run(&upload, &RefillConfig::default(), &mut Silent).unwrap();

    assert_eq!(report.header_row, 2);
    assert_eq!(report.candidates(), &[candidate("T100", "BLK", 1200.0, 2.0)]);
    assert_eq!(report.summary.skipped_missing_key, 1);
    assert_eq!(report.summary.skipped_no_warehouse, 1);
}

#[test]
fn missing_file_is_a_read_failure() {
    let dir = tempfile::tempdir().unwrap();
    let err = Upload::from_path(dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, RefillError::FileReadFailed(_)));
}

#[cfg(feature = "excel")]
mod excel {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn stock_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();

        let summary = workbook.add_worksheet();
        summary.set_name("Summary").unwrap();
        summary.write_string(0, 0, "See the Stock sheet").unwrap();

        let stock = workbook.add_worksheet();
        stock.set_name("Stock").unwrap();
        stock.write_string(0, 0, "Stock by branch").unwrap();
        for (col, title) in ["Item Code", "Color Code", "Total Warehouse Stock", "Total Sales Stock"]
            .iter()
            .enumerate()
        {
            stock.write_string(2, col as u16, *title).unwrap();
        }
        let rows: [(&str, &str, f64, f64); 4] = [
            ("A1", "RED", 10.0, 2.0),
            ("A1", "RED", 5.0, 1.0),
            ("A2", "BLUE", 0.0, 0.0),
            ("A3", "GREEN", 8.0, 6.0),
        ];
        for (i, (item, color, warehouse, sales)) in rows.iter().enumerate() {
            let r = 3 + i as u32;
            stock.write_string(r, 0, *item).unwrap();
            stock.write_string(r, 1, *color).unwrap();
            stock.write_number(r, 2, *warehouse).unwrap();
            stock.write_number(r, 3, *sales).unwrap();
        }

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn first_sheet_is_used_by_default() {
        let upload = Upload::new("stock.xlsx", stock_workbook());
        let err = refill::run(&upload, &RefillConfig::default(), &mut Silent).unwrap_err();
        assert!(matches!(err, RefillError::HeaderNotFound { .. }));
    }

    #[test]
    fn named_sheet_with_numeric_cells() {
        let config = RefillConfig {
            sheet: Some("Stock".into()),
            ..Default::default()
        };
        let upload = Upload::new("stock.xlsx", stock_workbook());
        let report = refill::run(&upload, &config, &mut Silent).unwrap();

        assert_eq!(report.sheet, "Stock");
        assert_eq!(report.candidates(), &[candidate("A1", "RED", 15.0, 3.0)]);

        let exported = refill::to_xlsx(report.candidates()).unwrap();
        let reread = refill::run(
            &Upload::new("Inventory_Refill_Report.xlsx", exported),
            &RefillConfig::default(),
            &mut Silent,
        );
        // The export has no item/color columns, so it is not itself a stock file.
        assert!(matches!(reread, Err(RefillError::HeaderNotFound { .. })));
    }

    #[test]
    fn misnamed_csv_fails_to_decode() {
        let upload = Upload::new("stock.xlsx", "Item Code,Color Code\n");
        let err = refill::run(&upload, &RefillConfig::default(), &mut Silent).unwrap_err();
        assert_eq!(err.kind(), "ParseFailed");
    }
}
