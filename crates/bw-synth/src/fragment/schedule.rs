//! Refresh schedule fragment generator

use crate::context::{SynthContext, TIMESTAMP_FORMAT};
use crate::error::SynthResult;
use crate::skeleton;
use bw_core::{DataSetDef, ImportMode, TemplateDocument};
use chrono::{DateTime, Duration, Months, Utc};
use serde_json::json;

/// Generate one refresh schedule resource per schedule on a SPICE dataset.
/// Direct-query datasets never carry schedules, so this is a no-op for them.
pub fn generate(
    dataset: &DataSetDef,
    doc: &mut TemplateDocument,
    ctx: &SynthContext,
) -> SynthResult<()> {
    if dataset.import_mode != ImportMode::Spice {
        return Ok(());
    }

    for schedule in &dataset.refresh_schedules {
        if doc.has_resource(&schedule.cfn_id) {
            log::info!(
                "refresh schedule with id {} already exists, skipping",
                schedule.cfn_id
            );
            continue;
        }
        log::info!(
            "Processing refresh schedule {} for dataset {} (ID {})",
            schedule.schedule_id,
            dataset.name,
            dataset.id
        );

        let mut detail = schedule.detail.clone();
        if let Some(frequency) = detail
            .get_mut("ScheduleFrequency")
            .and_then(|v| v.as_object_mut())
        {
            // The metadata source returns this field with inconsistent
            // casing; the declarative schema wants `TimeZone`.
            if let Some(tz) = frequency.remove("Timezone") {
                frequency.insert("TimeZone".to_string(), tz);
            }
        }

        let interval = detail
            .get("ScheduleFrequency")
            .and_then(|f| f.get("Interval"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let start_after = start_after(ctx.synthesized_at, interval);
        if let Some(map) = detail.as_object_mut() {
            map.insert(
                "StartAfterDateTime".to_string(),
                json!(start_after.format(TIMESTAMP_FORMAT).to_string()),
            );
        }

        let mut resource = skeleton::refresh_schedule_resource()?;
        let props = resource.properties_mut();
        props.insert("DataSetId".to_string(), json!(dataset.id));
        props.insert("Schedule".to_string(), detail);
        resource.depends_on = vec![dataset.cfn_id.clone()];

        doc.insert_resource(&schedule.cfn_id, resource);
    }

    Ok(())
}

/// First refresh instant, relative to the synthesis run: one month out for
/// MONTHLY schedules, one week for WEEKLY, seven days otherwise.
pub fn start_after(from: DateTime<Utc>, interval: &str) -> DateTime<Utc> {
    match interval {
        "MONTHLY" => from.checked_add_months(Months::new(1)).unwrap_or(from),
        "WEEKLY" => from + Duration::weeks(1),
        _ => from + Duration::days(7),
    }
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod tests;
