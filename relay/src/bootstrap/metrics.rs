use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub fn init_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let recorder_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)?;

    metrics::describe_counter!(
        "relay_requests_total",
        "Relayed requests by outcome (responded, error_502, error_500)"
    );
    metrics::describe_counter!(
        "relay_logins_total",
        "Upstream logins performed by the relay, by outcome"
    );
    metrics::describe_counter!(
        "relay_auth_checks_total",
        "Caller session checks, by result"
    );

    Ok(recorder_handle)
}
