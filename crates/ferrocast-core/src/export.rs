use crate::error::ExportError;
use crate::ForecastSeries;

/// File name offered for the forecast download.
pub const CSV_FILE_NAME: &str = "forecast.csv";
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Serializes the forecast as `date,forecast` rows with ISO-8601 dates.
pub fn export_csv(forecast: &ForecastSeries) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if forecast.is_empty() {
        writer.write_record(["date", "forecast"])?;
    }
    for point in forecast.points() {
        writer.serialize(point)?;
    }
    writer
        .into_inner()
        .map_err(|error| ExportError::Io(error.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ForecastPoint, MarketDate};

    fn series(values: &[(&str, f64)]) -> ForecastSeries {
        ForecastSeries::new(
            values
                .iter()
                .map(|(date, value)| {
                    ForecastPoint::new(MarketDate::parse(date).expect("date"), *value)
                })
                .collect(),
        )
        .expect("series")
    }

    #[test]
    fn writes_header_and_one_row_per_point() {
        let bytes = export_csv(&series(&[("2022-06-30", 101.5), ("2022-07-31", 102.25)]))
            .expect("export");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(text, "date,forecast\n2022-06-30,101.5\n2022-07-31,102.25\n");
    }

    #[test]
    fn empty_forecast_still_has_header() {
        let bytes = export_csv(&series(&[])).expect("export");
        assert_eq!(bytes, b"date,forecast\n");
    }
}
