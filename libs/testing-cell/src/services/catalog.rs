use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::domain::{Gender, TargetGender};

use crate::models::{
    BookingError, CreateServiceRequest, CreateServiceTypeRequest, ResultTemplate,
    ResultTemplatePayload, ResultType, TestingService, TestingServiceStatus, TestingServiceType,
    TestingServiceTypeStatus, UpdateServiceStatusRequest,
};

/// Select clause pulling a service together with its owning type.
pub const SERVICE_WITH_TYPE: &str = "*,testing_service_type:testing_service_types(*)";

pub struct TestingCatalogService {
    supabase: Arc<SupabaseClient>,
}

impl TestingCatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    // ==============================================================================
    // SERVICE TYPES
    // ==============================================================================

    pub async fn list_types(
        &self,
        auth_token: &str,
    ) -> Result<Vec<TestingServiceType>, BookingError> {
        let path = "/rest/v1/testing_service_types?order=name.asc";
        self.supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))
    }

    pub async fn create_type(
        &self,
        request: CreateServiceTypeRequest,
        auth_token: &str,
    ) -> Result<TestingServiceType, BookingError> {
        if request.name.trim().is_empty() {
            return Err(BookingError::ValidationError(
                "Testing service type name must not be empty".to_string(),
            ));
        }

        let row = json!({
            "name": request.name,
            "description": request.description,
            "target_gender": request.target_gender,
            "status": TestingServiceTypeStatus::Active,
        });

        let created: TestingServiceType = self
            .supabase
            .insert("testing_service_types", Some(auth_token), row)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        info!("Testing service type {} created", created.id);
        Ok(created)
    }

    // ==============================================================================
    // SERVICES
    // ==============================================================================

    /// Catalog as a customer sees it: available services whose type targets
    /// their gender or any.
    pub async fn list_services_for_gender(
        &self,
        gender: Gender,
        auth_token: &str,
    ) -> Result<Vec<TestingService>, BookingError> {
        let path = format!(
            "/rest/v1/testing_services?status=eq.{}&select={}&testing_service_type.target_gender=in.(any,{})&order=name.asc",
            TestingServiceStatus::Available,
            SERVICE_WITH_TYPE,
            gender,
        );
        let services: Vec<TestingService> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        // Inner-join semantics: drop services whose embedded type was filtered out.
        let visible: Vec<TestingService> = services
            .into_iter()
            .filter(|s| s.testing_service_type.is_some())
            .collect();

        if visible.is_empty() {
            return Err(BookingError::ServiceNotFound);
        }

        Ok(visible)
    }

    /// Full catalog, including retired services, for the back office.
    pub async fn list_all_services(
        &self,
        auth_token: &str,
    ) -> Result<Vec<TestingService>, BookingError> {
        let path = format!(
            "/rest/v1/testing_services?select={}&order=name.asc",
            SERVICE_WITH_TYPE
        );
        let services: Vec<TestingService> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if services.is_empty() {
            return Err(BookingError::ServiceNotFound);
        }

        Ok(services)
    }

    pub async fn get_service(
        &self,
        service_id: Uuid,
        auth_token: &str,
    ) -> Result<TestingService, BookingError> {
        let path = format!(
            "/rest/v1/testing_services?id=eq.{}&select={}",
            service_id, SERVICE_WITH_TYPE
        );
        let rows: Vec<TestingService> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(BookingError::ServiceNotFound)
    }

    /// Create a service and its result templates. The template list is
    /// validated as a whole before the first insert.
    pub async fn create_service(
        &self,
        request: CreateServiceRequest,
        auth_token: &str,
    ) -> Result<TestingService, BookingError> {
        if request.name.trim().is_empty() {
            return Err(BookingError::ValidationError(
                "Testing service name must not be empty".to_string(),
            ));
        }
        if request.price < 0.0 {
            return Err(BookingError::ValidationError(
                "Testing service price cannot be negative".to_string(),
            ));
        }

        validate_result_templates(&request.result_templates)?;

        self.verify_type_exists(request.type_id, auth_token).await?;

        let row = json!({
            "type_id": request.type_id,
            "name": request.name,
            "description": request.description,
            "price": request.price,
            "status": TestingServiceStatus::Available,
            "overall_flag_logic": request.overall_flag_logic,
        });

        let service: TestingService = self
            .supabase
            .insert("testing_services", Some(auth_token), row)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        for template in &request.result_templates {
            let template_row = json!({
                "service_id": service.id,
                "title": template.title,
                "result_type": template.result_type,
                "measure_unit": template.measure_unit,
                "min_value": template.min_value,
                "max_value": template.max_value,
                "target_gender": template.target_gender,
            });

            let _: ResultTemplate = self
                .supabase
                .insert("testing_service_results", Some(auth_token), template_row)
                .await
                .map_err(|e| BookingError::DatabaseError(e.to_string()))?;
        }

        info!(
            "Testing service {} created with {} result templates",
            service.id,
            request.result_templates.len()
        );
        Ok(service)
    }

    pub async fn update_service_status(
        &self,
        service_id: Uuid,
        request: UpdateServiceStatusRequest,
        auth_token: &str,
    ) -> Result<TestingService, BookingError> {
        let updated: Vec<TestingService> = self
            .supabase
            .update(
                "testing_services",
                &format!("id=eq.{}", service_id),
                Some(auth_token),
                json!({ "status": request.status }),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(BookingError::ServiceNotFound)
    }

    /// Result templates of a service, narrowed to the templates applying to
    /// one customer gender when given.
    pub async fn service_templates(
        &self,
        service_id: Uuid,
        gender: Option<Gender>,
        auth_token: &str,
    ) -> Result<Vec<ResultTemplate>, BookingError> {
        let gender_filter = match gender {
            Some(gender) => format!("&target_gender=in.(any,{})", gender),
            None => String::new(),
        };
        let path = format!(
            "/rest/v1/testing_service_results?service_id=eq.{}{}&order=title.asc",
            service_id, gender_filter
        );

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))
    }

    async fn verify_type_exists(
        &self,
        type_id: Uuid,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        let count = self
            .supabase
            .count(
                "testing_service_types",
                &format!("id=eq.{}", type_id),
                Some(auth_token),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if count == 0 {
            return Err(BookingError::ServiceTypeNotFound);
        }
        Ok(())
    }
}

/// Whole-list validation for result templates:
/// numeric templates carry unit and range (min <= max), non-numeric ones must
/// not; (title, gender) pairs are unique; a title either targets any gender
/// or supplies both gender-specific variants.
pub fn validate_result_templates(
    templates: &[ResultTemplatePayload],
) -> Result<(), BookingError> {
    let mut title_genders: HashMap<&str, HashSet<TargetGender>> = HashMap::new();
    let mut seen: HashSet<(&str, TargetGender)> = HashSet::new();

    for template in templates {
        let title = template.title.as_str();

        if template.result_type != ResultType::Numeric
            && (template.measure_unit.is_some()
                || template.min_value.is_some()
                || template.max_value.is_some())
        {
            return Err(BookingError::ValidationError(format!(
                "Non-numeric test '{}' cannot carry a measure unit or min/max values",
                title
            )));
        }

        if template.result_type == ResultType::Numeric {
            let (min, max) = match (template.min_value, template.max_value) {
                (Some(min), Some(max)) if template.measure_unit.is_some() => (min, max),
                _ => {
                    return Err(BookingError::ValidationError(format!(
                        "Numeric test '{}' is missing its measure unit or min/max values",
                        title
                    )))
                }
            };

            if min > max {
                return Err(BookingError::ValidationError(format!(
                    "Test '{}' has min value greater than max value",
                    title
                )));
            }
        }

        if !seen.insert((title, template.target_gender)) {
            return Err(BookingError::ValidationError(format!(
                "Duplicate test '{}' for target gender {}",
                title, template.target_gender
            )));
        }

        title_genders
            .entry(title)
            .or_default()
            .insert(template.target_gender);
    }

    for (title, genders) in &title_genders {
        let has_any = genders.contains(&TargetGender::Any);
        let has_male = genders.contains(&TargetGender::Male);
        let has_female = genders.contains(&TargetGender::Female);

        if has_any && (has_male || has_female) {
            return Err(BookingError::ValidationError(format!(
                "Test '{}' cannot mix an any-gender template with gender-specific ones",
                title
            )));
        }

        if !has_any && (has_male ^ has_female) {
            return Err(BookingError::ValidationError(format!(
                "Gender-specific test '{}' must supply both male and female templates",
                title
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(title: &str, gender: TargetGender, min: f64, max: f64) -> ResultTemplatePayload {
        ResultTemplatePayload {
            title: title.to_string(),
            result_type: ResultType::Numeric,
            measure_unit: Some(crate::models::MeasureUnit::MillimolPerLiter),
            min_value: Some(min),
            max_value: Some(max),
            target_gender: gender,
        }
    }

    fn flag(title: &str, gender: TargetGender) -> ResultTemplatePayload {
        ResultTemplatePayload {
            title: title.to_string(),
            result_type: ResultType::PositiveNegative,
            measure_unit: None,
            min_value: None,
            max_value: None,
            target_gender: gender,
        }
    }

    #[test]
    fn accepts_well_formed_template_set() {
        let templates = vec![
            numeric("Glucose", TargetGender::Any, 3.9, 6.4),
            flag("HIV Ag/Ab", TargetGender::Any),
            numeric("Hemoglobin", TargetGender::Male, 130.0, 170.0),
            numeric("Hemoglobin", TargetGender::Female, 120.0, 150.0),
        ];
        assert!(validate_result_templates(&templates).is_ok());
    }

    #[test]
    fn rejects_numeric_without_range() {
        let mut bad = numeric("Glucose", TargetGender::Any, 3.9, 6.4);
        bad.max_value = None;
        assert!(validate_result_templates(&[bad]).is_err());
    }

    #[test]
    fn rejects_flag_with_range() {
        let mut bad = flag("HIV Ag/Ab", TargetGender::Any);
        bad.min_value = Some(0.0);
        assert!(validate_result_templates(&[bad]).is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        let bad = numeric("Glucose", TargetGender::Any, 6.4, 3.9);
        assert!(validate_result_templates(&[bad]).is_err());
    }

    #[test]
    fn rejects_duplicate_title_gender_pair() {
        let templates = vec![
            flag("HIV Ag/Ab", TargetGender::Any),
            flag("HIV Ag/Ab", TargetGender::Any),
        ];
        assert!(validate_result_templates(&templates).is_err());
    }

    #[test]
    fn rejects_mixing_any_with_gender_specific() {
        let templates = vec![
            numeric("Hemoglobin", TargetGender::Any, 120.0, 170.0),
            numeric("Hemoglobin", TargetGender::Male, 130.0, 170.0),
        ];
        assert!(validate_result_templates(&templates).is_err());
    }

    #[test]
    fn rejects_half_of_a_gender_specific_pair() {
        let templates = vec![numeric("Hemoglobin", TargetGender::Male, 130.0, 170.0)];
        assert!(validate_result_templates(&templates).is_err());
    }
}
