//! Alert recommendations.
//!
//! [`StaticRecommendations`] serves a fixed table per category and severity.
//! [`AiRecommendations`] asks a language model for a category-shaped JSON
//! object and falls back to the static table on any failure, including a
//! timeout. Neither ever fails from the caller's point of view.

use std::collections::BTreeMap;
use std::time::Duration;

use envirolens_ai::providers::{DEFAULT_MAX_TOKENS, LlmProvider, Message};
use envirolens_ai::{AiError, extract_json_object};
use envirolens_alert_models::{
    AirQualityRecommendations, Alert, AlertType, GreenSpaceRecommendations,
    RecommendationPayload, WaterSecurityRecommendations,
};
use envirolens_reading_models::EnvironmentalCategory;

/// Supplies recommendations for an alert.
#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Returns recommendations for an alert of `alert_type` in `category`
    /// triggered by `metrics`.
    async fn recommend(
        &self,
        category: EnvironmentalCategory,
        alert_type: AlertType,
        metrics: &BTreeMap<String, f64>,
    ) -> RecommendationPayload;
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Fixed recommendations, keyed by category and whether the alert is a
/// danger alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRecommendations;

impl StaticRecommendations {
    /// Returns the static payload for `category` and `alert_type`.
    #[must_use]
    pub fn payload(category: EnvironmentalCategory, alert_type: AlertType) -> RecommendationPayload {
        let danger = alert_type == AlertType::Danger;

        match category {
            EnvironmentalCategory::AirQuality => {
                RecommendationPayload::AirQuality(AirQualityRecommendations {
                    immediate: if danger {
                        lines(&[
                            "Stay indoors with windows and doors closed",
                            "Run air purifiers with HEPA filters",
                            "Wear an N95 mask if you must go outside",
                        ])
                    } else {
                        lines(&[
                            "Limit prolonged outdoor exertion, especially for sensitive groups",
                            "Keep windows closed during peak traffic hours",
                        ])
                    },
                    short_term: lines(&[
                        "Check air quality forecasts before planning outdoor activities",
                        "Use public transit or carpool to reduce local emissions",
                    ]),
                    long_term: lines(&[
                        "Support clean energy and low-emission transport policies",
                        "Plant trees and vegetation barriers along busy roads",
                    ]),
                })
            }
            EnvironmentalCategory::WaterSecurity => {
                RecommendationPayload::WaterSecurity(WaterSecurityRecommendations {
                    conservation: if danger {
                        lines(&[
                            "Restrict water use to essential needs",
                            "Suspend lawn irrigation and car washing",
                        ])
                    } else {
                        lines(&[
                            "Take shorter showers and fix household leaks",
                            "Water gardens early in the morning or late in the evening",
                        ])
                    },
                    infrastructure: lines(&[
                        "Install rainwater harvesting and greywater systems",
                        "Upgrade to water-efficient fixtures and appliances",
                    ]),
                    emergency: if danger {
                        lines(&[
                            "Store at least three days of drinking water per person",
                            "Review evacuation routes and local flood warnings",
                            "Move valuables and documents above potential flood levels",
                        ])
                    } else {
                        lines(&["Keep an emergency water supply on hand"])
                    },
                })
            }
            EnvironmentalCategory::GreenSpace => {
                RecommendationPayload::GreenSpace(GreenSpaceRecommendations {
                    planning: if danger {
                        lines(&[
                            "Prioritize new parks and green corridors in heat-vulnerable areas",
                            "Require green roofs or cool roofs on new developments",
                        ])
                    } else {
                        lines(&["Integrate street trees into upcoming road projects"])
                    },
                    community: lines(&[
                        "Join or organize community tree planting events",
                        "Start community gardens on vacant lots",
                    ]),
                    policy: lines(&[
                        "Set minimum canopy coverage targets for neighborhoods",
                        "Protect existing mature trees during development",
                    ]),
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for StaticRecommendations {
    async fn recommend(
        &self,
        category: EnvironmentalCategory,
        alert_type: AlertType,
        _metrics: &BTreeMap<String, f64>,
    ) -> RecommendationPayload {
        Self::payload(category, alert_type)
    }
}

const SYSTEM_PROMPT: &str = "You are an environmental health advisor. You write short, concrete, \
actionable recommendations for residents and local officials responding to an environmental \
alert. Respond with a single JSON object and nothing else.";

/// Builds the user prompt describing the alert and the JSON shape to
/// return.
fn build_prompt(
    category: EnvironmentalCategory,
    alert_type: AlertType,
    metrics: &BTreeMap<String, f64>,
) -> String {
    let readings = if metrics.is_empty() {
        "none reported".to_string()
    } else {
        metrics
            .iter()
            .map(|(name, value)| format!("{name} = {value:.2}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let schema = match category {
        EnvironmentalCategory::AirQuality => {
            r#"{"immediate": [string], "shortTerm": [string], "longTerm": [string]}"#
        }
        EnvironmentalCategory::WaterSecurity => {
            r#"{"conservation": [string], "infrastructure": [string], "emergency": [string]}"#
        }
        EnvironmentalCategory::GreenSpace => {
            r#"{"planning": [string], "community": [string], "policy": [string]}"#
        }
    };

    format!(
        "A {alert_type} level {category_label} alert was raised.\n\
         Triggering metrics: {readings}.\n\n\
         Give 2-4 recommendations per section. Return JSON matching exactly this shape:\n\
         {schema}",
        category_label = category.label(),
    )
}

/// Parses a model reply into the payload shape for `category`.
fn parse_payload(
    category: EnvironmentalCategory,
    text: &str,
) -> Result<RecommendationPayload, AiError> {
    let value = extract_json_object(text)?;

    let payload = match category {
        EnvironmentalCategory::AirQuality => {
            RecommendationPayload::AirQuality(serde_json::from_value(value)?)
        }
        EnvironmentalCategory::WaterSecurity => {
            RecommendationPayload::WaterSecurity(serde_json::from_value(value)?)
        }
        EnvironmentalCategory::GreenSpace => {
            RecommendationPayload::GreenSpace(serde_json::from_value(value)?)
        }
    };

    Ok(payload)
}

/// Recommendations generated by a language model, with the static table
/// as fallback.
pub struct AiRecommendations {
    provider: Box<dyn LlmProvider>,
    timeout: Duration,
}

impl AiRecommendations {
    /// Wraps `provider`; each request is abandoned after `timeout`.
    #[must_use]
    pub fn new(provider: Box<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn generate(
        &self,
        category: EnvironmentalCategory,
        alert_type: AlertType,
        metrics: &BTreeMap<String, f64>,
    ) -> Result<RecommendationPayload, AiError> {
        let prompt = build_prompt(category, alert_type, metrics);
        let text = self
            .provider
            .complete(SYSTEM_PROMPT, &[Message::user(prompt)], DEFAULT_MAX_TOKENS)
            .await?;

        parse_payload(category, &text)
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for AiRecommendations {
    async fn recommend(
        &self,
        category: EnvironmentalCategory,
        alert_type: AlertType,
        metrics: &BTreeMap<String, f64>,
    ) -> RecommendationPayload {
        match tokio::time::timeout(self.timeout, self.generate(category, alert_type, metrics)).await
        {
            Ok(Ok(payload)) => payload,
            Ok(Err(e)) => {
                log::warn!(
                    "{} recommendations for {category} failed, using static fallback: {e}",
                    self.provider.name()
                );
                StaticRecommendations::payload(category, alert_type)
            }
            Err(_) => {
                log::warn!(
                    "{} recommendations for {category} timed out after {:?}, using static fallback",
                    self.provider.name(),
                    self.timeout
                );
                StaticRecommendations::payload(category, alert_type)
            }
        }
    }
}

/// Fills in `recommendations` on every alert, querying the provider for
/// all alerts concurrently.
pub async fn attach_recommendations(provider: &dyn RecommendationProvider, alerts: &mut [Alert]) {
    let payloads = futures::future::join_all(
        alerts
            .iter()
            .map(|alert| provider.recommend(alert.category, alert.alert_type, &alert.metrics)),
    )
    .await;

    for (alert, payload) in alerts.iter_mut().zip(payloads) {
        alert.recommendations = Some(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use envirolens_reading_models::Coordinate;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct MockProvider(Reply);

    #[async_trait::async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
            _max_tokens: u32,
        ) -> Result<String, AiError> {
            match self.0 {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(AiError::Provider {
                    message: "boom".to_string(),
                }),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(String::new())
                }
            }
        }
    }

    fn ai(reply: Reply) -> AiRecommendations {
        AiRecommendations::new(Box::new(MockProvider(reply)), Duration::from_millis(50))
    }

    fn aqi_metrics() -> BTreeMap<String, f64> {
        BTreeMap::from([("aqi".to_string(), 180.0)])
    }

    #[test]
    fn static_payload_matches_category() {
        for category in EnvironmentalCategory::all() {
            for alert_type in [AlertType::Info, AlertType::Warning, AlertType::Danger] {
                let payload = StaticRecommendations::payload(*category, alert_type);
                assert_eq!(payload.category(), *category);
            }
        }
    }

    #[test]
    fn danger_payload_differs_from_warning() {
        assert_ne!(
            StaticRecommendations::payload(EnvironmentalCategory::AirQuality, AlertType::Danger),
            StaticRecommendations::payload(EnvironmentalCategory::AirQuality, AlertType::Warning)
        );
    }

    #[test]
    fn prompt_names_schema_and_metrics() {
        let prompt = build_prompt(
            EnvironmentalCategory::WaterSecurity,
            AlertType::Danger,
            &BTreeMap::from([("floodRisk".to_string(), 75.0)]),
        );
        assert!(prompt.contains("danger"));
        assert!(prompt.contains("floodRisk = 75.00"));
        assert!(prompt.contains("\"infrastructure\""));
    }

    #[tokio::test]
    async fn uses_model_output_when_well_formed() {
        let provider = ai(Reply::Text(
            "```json\n{\"immediate\":[\"Close windows\"],\"shortTerm\":[],\"longTerm\":[]}\n```",
        ));
        let payload = provider
            .recommend(EnvironmentalCategory::AirQuality, AlertType::Danger, &aqi_metrics())
            .await;

        let RecommendationPayload::AirQuality(air) = payload else {
            panic!("expected air quality payload");
        };
        assert_eq!(air.immediate, vec!["Close windows".to_string()]);
    }

    #[tokio::test]
    async fn wrong_shape_falls_back_to_static() {
        let provider = ai(Reply::Text(r#"{"planning":["x"],"community":[],"policy":[]}"#));
        let payload = provider
            .recommend(EnvironmentalCategory::AirQuality, AlertType::Danger, &aqi_metrics())
            .await;
        assert_eq!(
            payload,
            StaticRecommendations::payload(EnvironmentalCategory::AirQuality, AlertType::Danger)
        );
    }

    #[tokio::test]
    async fn provider_error_falls_back_to_static() {
        let payload = ai(Reply::Fail)
            .recommend(EnvironmentalCategory::GreenSpace, AlertType::Warning, &BTreeMap::new())
            .await;
        assert_eq!(
            payload,
            StaticRecommendations::payload(EnvironmentalCategory::GreenSpace, AlertType::Warning)
        );
    }

    #[tokio::test]
    async fn timeout_falls_back_to_static() {
        let payload = ai(Reply::Hang)
            .recommend(EnvironmentalCategory::WaterSecurity, AlertType::Danger, &BTreeMap::new())
            .await;
        assert_eq!(payload.category(), EnvironmentalCategory::WaterSecurity);
    }

    #[tokio::test]
    async fn attaches_payload_to_every_alert() {
        let now = Utc::now();
        let mut alerts: Vec<Alert> = [EnvironmentalCategory::AirQuality, EnvironmentalCategory::GreenSpace]
            .into_iter()
            .map(|category| Alert {
                alert_type: AlertType::Warning,
                category,
                title: "t".to_string(),
                message: "m".to_string(),
                location: Coordinate::new(0.0, 0.0),
                location_label: None,
                severity: 40,
                is_active: true,
                actionable: true,
                recommendations: None,
                metrics: BTreeMap::new(),
                created_at: now,
            })
            .collect();

        attach_recommendations(&StaticRecommendations, &mut alerts).await;

        for alert in &alerts {
            let payload = alert.recommendations.as_ref().unwrap();
            assert_eq!(payload.category(), alert.category);
        }
    }
}
