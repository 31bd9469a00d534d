//! Arrow schemas for the three datasets.

use std::sync::Arc;

use arrow_array::{
    Array, ArrayRef, Date32Array, Float64Array, RecordBatch, StringArray, UInt64Array,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, Result};
use crate::models::{CityAggregate, CleanedRecord, ListingRecord};
use crate::storage::{Dataset, DatasetKind};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

const LISTING_TEXT_COLUMNS: [&str; 10] = [
    "year",
    "make",
    "model",
    "title",
    "price",
    "mileage",
    "dealer_type",
    "location",
    "link",
    "source_city",
];

fn listing_fields() -> Vec<Field> {
    let mut fields: Vec<Field> = LISTING_TEXT_COLUMNS
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, false))
        .collect();
    fields.push(Field::new("capture_date", DataType::Date32, false));
    fields
}

fn strings<T>(rows: &[T], field: impl Fn(&T) -> &str) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(rows.iter().map(field)))
}

fn listing_columns<T>(rows: &[T], listing: impl Fn(&T) -> &ListingRecord) -> Vec<ArrayRef> {
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| date_to_days(listing(r).capture_date))
        .collect();

    vec![
        strings(rows, |r| listing(r).year.as_str()),
        strings(rows, |r| listing(r).make.as_str()),
        strings(rows, |r| listing(r).model.as_str()),
        strings(rows, |r| listing(r).title.as_str()),
        strings(rows, |r| listing(r).price.as_str()),
        strings(rows, |r| listing(r).mileage.as_str()),
        strings(rows, |r| listing(r).dealer_type.as_str()),
        strings(rows, |r| listing(r).location.as_str()),
        strings(rows, |r| listing(r).link.as_str()),
        strings(rows, |r| listing(r).source_city.as_str()),
        Arc::new(Date32Array::from(dates)),
    ]
}

fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Result<NaiveDate> {
    days.checked_add(EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| AppError::schema(format!("capture_date {days} is out of range")))
}

fn optional(array: &Float64Array, i: usize) -> Option<f64> {
    if array.is_null(i) {
        None
    } else {
        Some(array.value(i))
    }
}

/// Typed access to a batch's columns by name.
struct Columns<'a> {
    batch: &'a RecordBatch,
}

impl<'a> Columns<'a> {
    fn new(batch: &'a RecordBatch) -> Self {
        Self { batch }
    }

    fn get<A: Array + 'static>(&self, name: &str) -> Result<&'a A> {
        let column = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| AppError::schema(format!("missing column '{name}'")))?;
        column.as_any().downcast_ref::<A>().ok_or_else(|| {
            AppError::schema(format!(
                "column '{name}' has unexpected type {}",
                column.data_type()
            ))
        })
    }

    fn listings(&self) -> Result<Vec<ListingRecord>> {
        let text = LISTING_TEXT_COLUMNS
            .iter()
            .map(|name| self.get::<StringArray>(name))
            .collect::<Result<Vec<_>>>()?;
        let dates = self.get::<Date32Array>("capture_date")?;

        (0..self.batch.num_rows())
            .map(|i| -> Result<ListingRecord> {
                let value = |column: usize| text[column].value(i).to_string();
                Ok(ListingRecord {
                    year: value(0),
                    make: value(1),
                    model: value(2),
                    title: value(3),
                    price: value(4),
                    mileage: value(5),
                    dealer_type: text[6].value(i).parse()?,
                    location: value(7),
                    link: value(8),
                    source_city: value(9),
                    capture_date: days_to_date(dates.value(i))?,
                })
            })
            .collect()
    }
}

impl Dataset for ListingRecord {
    const KIND: DatasetKind = DatasetKind::Capture;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(listing_fields()))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(
            Self::schema(),
            listing_columns(rows, |r| r),
        )?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        Columns::new(batch).listings()
    }
}

impl Dataset for CleanedRecord {
    const KIND: DatasetKind = DatasetKind::Cleaned;

    fn schema() -> SchemaRef {
        let mut fields = listing_fields();
        fields.push(Field::new("price_value", DataType::Float64, true));
        fields.push(Field::new("mileage_value", DataType::Float64, true));
        Arc::new(Schema::new(fields))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let mut columns = listing_columns(rows, |r| &r.listing);
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.price_value).collect::<Vec<_>>(),
        )));
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.mileage_value).collect::<Vec<_>>(),
        )));
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let columns = Columns::new(batch);
        let listings = columns.listings()?;
        let prices = columns.get::<Float64Array>("price_value")?;
        let mileages = columns.get::<Float64Array>("mileage_value")?;

        Ok(listings
            .into_iter()
            .enumerate()
            .map(|(i, listing)| CleanedRecord {
                listing,
                price_value: optional(prices, i),
                mileage_value: optional(mileages, i),
            })
            .collect())
    }
}

impl Dataset for CityAggregate {
    const KIND: DatasetKind = DatasetKind::Aggregated;

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("source_city", DataType::Utf8, false),
            Field::new("avg_price", DataType::Float64, false),
            Field::new("median_price", DataType::Float64, false),
            Field::new("listing_count", DataType::UInt64, false),
            Field::new("avg_mileage", DataType::Float64, true),
            Field::new("avg_year", DataType::Float64, false),
        ]))
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let floats = |field: fn(&CityAggregate) -> f64| -> ArrayRef {
            Arc::new(Float64Array::from(rows.iter().map(field).collect::<Vec<_>>()))
        };

        let columns: Vec<ArrayRef> = vec![
            strings(rows, |r| r.source_city.as_str()),
            floats(|r| r.avg_price),
            floats(|r| r.median_price),
            Arc::new(UInt64Array::from(
                rows.iter().map(|r| r.listing_count).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.avg_mileage).collect::<Vec<_>>(),
            )),
            floats(|r| r.avg_year),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let columns = Columns::new(batch);
        let cities = columns.get::<StringArray>("source_city")?;
        let avg_price = columns.get::<Float64Array>("avg_price")?;
        let median_price = columns.get::<Float64Array>("median_price")?;
        let counts = columns.get::<UInt64Array>("listing_count")?;
        let avg_mileage = columns.get::<Float64Array>("avg_mileage")?;
        let avg_year = columns.get::<Float64Array>("avg_year")?;

        Ok((0..batch.num_rows())
            .map(|i| CityAggregate {
                source_city: cities.value(i).to_string(),
                avg_price: avg_price.value(i),
                median_price: median_price.value(i),
                listing_count: counts.value(i),
                avg_mileage: optional(avg_mileage, i),
                avg_year: avg_year.value(i),
            })
            .collect())
    }
}
