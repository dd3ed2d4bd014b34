use prometheus::{Encoder, GaugeVec, TextEncoder};
use solaxcloud_rs::api::FetchClient;
use solaxcloud_rs::mapper::{self, Metric};
use solaxcloud_rs::model::DeviceInfo;

lazy_static! {
    static ref REALTIME_METRIC_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "solax_metric",
            "realtime metric reported by the SolaX Cloud API",
        ),
        &["metric", "serial_number"],
    )
    .unwrap();
    static ref DEVICE_INFO_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "solax_device_info",
            "device identity reported by the SolaX Cloud API",
        ),
        &["serial_number", "model", "sw_version"],
    )
    .unwrap();
}

/// Feed one mapped metric to the Prometheus registry. Values arrive as raw
/// JSON and are coerced at read time; textual diagnostics have no gauge
/// representation and are skipped.
fn process_metric(metric: &Metric, serial_number: &str) {
    match mapper::value_as_f64(&metric.value) {
        Some(value) => {
            REALTIME_METRIC_GAUGE
                .with_label_values(&[&metric.descriptor.key, serial_number])
                .set(value);
        }
        None => {
            log::trace!(
                "skipping non-numeric metric {}: {:?}",
                metric.descriptor.key,
                metric.value
            );
        }
    }
}

/// Collect all metrics from the cloud API, updating Prometheus exporter
/// registry.
pub async fn collect(
    client: &FetchClient,
    serial_number: &str,
) -> Result<(), solaxcloud_rs::Error> {
    let data = client.fetch().await?;

    let info = DeviceInfo::from_payload(&data, serial_number);
    DEVICE_INFO_GAUGE
        .with_label_values(&[
            serial_number,
            info.model.as_deref().unwrap_or(""),
            info.sw_version.as_deref().unwrap_or(""),
        ])
        .set(1.0);

    for metric in mapper::map(&data) {
        process_metric(&metric, serial_number);
    }

    Ok(())
}

/// Read metrics from Prometheus exporter registry.
pub async fn read() -> Result<String, solaxcloud_rs::Error> {
    // Gather the metrics.
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).or(Err(solaxcloud_rs::Error::FormatError))
}
