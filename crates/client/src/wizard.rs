//! Four-step complaint wizard.

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::api::PortalApi;
use crate::error::{ClientError, ClientResult};
use crate::types::{NewComplaint, UrgencyLevel};

const MAX_EVIDENCE: usize = 20;
const MAX_EVIDENCE_LEN: usize = 512;

/// Wizard steps, numbered as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    /// Category, subcategory and title.
    Details = 1,
    /// What happened.
    Description = 2,
    /// Evidence references, then submit.
    Evidence = 3,
    /// Shows the complaint ID.
    Confirmation = 4,
}

impl WizardStep {
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }
}

/// The complaint as filled in so far.
#[derive(Debug, Clone, Default)]
pub struct ComplaintDraft {
    pub category: String,
    pub subcategory: String,
    pub title: String,
    pub description: String,
    pub incident_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub suspicious_entity: Option<String>,
    pub financial_loss: Option<f64>,
    pub urgency_level: UrgencyLevel,
    pub is_anonymous: bool,
    pub evidence: Vec<String>,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn optional(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ComplaintDraft {
    fn check_details(&self) -> ClientResult<()> {
        if blank(&self.category) {
            return Err(ClientError::validation("Choose a category"));
        }
        if blank(&self.subcategory) {
            return Err(ClientError::validation("Choose a subcategory"));
        }
        if blank(&self.title) {
            return Err(ClientError::validation("Enter a title"));
        }
        Ok(())
    }

    fn check_description(&self) -> ClientResult<()> {
        if blank(&self.description) {
            return Err(ClientError::validation("Describe what happened"));
        }
        if let Some(loss) = self.financial_loss
            && !(loss.is_finite() && loss >= 0.0)
        {
            return Err(ClientError::validation(
                "Financial loss must be zero or more",
            ));
        }
        if let Some(date) = self.incident_date
            && date > Utc::now().date_naive()
        {
            return Err(ClientError::validation(
                "Incident date cannot be in the future",
            ));
        }
        Ok(())
    }

    fn to_request(&self) -> NewComplaint {
        NewComplaint {
            category: self.category.trim().to_string(),
            subcategory: self.subcategory.trim().to_string(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            incident_date: self.incident_date,
            location: optional(self.location.as_ref()),
            suspicious_entity: optional(self.suspicious_entity.as_ref()),
            financial_loss: self.financial_loss,
            urgency_level: self.urgency_level,
            is_anonymous: self.is_anonymous,
            evidence: self.evidence.clone(),
        }
    }
}

/// Walks a citizen through filing one complaint.
#[derive(Debug, Clone)]
pub struct ComplaintWizard {
    step: WizardStep,
    draft: ComplaintDraft,
    complaint_id: Option<String>,
}

impl Default for ComplaintWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplaintWizard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: WizardStep::Details,
            draft: ComplaintDraft::default(),
            complaint_id: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub const fn draft(&self) -> &ComplaintDraft {
        &self.draft
    }

    /// Edit the draft. Ignored once submitted.
    pub fn draft_mut(&mut self) -> Option<&mut ComplaintDraft> {
        (self.step != WizardStep::Confirmation).then_some(&mut self.draft)
    }

    /// The ID the server assigned, once submitted.
    #[must_use]
    pub fn complaint_id(&self) -> Option<&str> {
        self.complaint_id.as_deref()
    }

    /// Advance from step 1 or 2. Fails, staying put, if the step is incomplete.
    pub fn next(&mut self) -> ClientResult<WizardStep> {
        self.step = match self.step {
            WizardStep::Details => {
                self.draft.check_details()?;
                WizardStep::Description
            }
            WizardStep::Description => {
                self.draft.check_description()?;
                WizardStep::Evidence
            }
            WizardStep::Evidence => {
                return Err(ClientError::validation("Submit the complaint to continue"));
            }
            WizardStep::Confirmation => return Err(ClientError::validation("Already submitted")),
        };
        Ok(self.step)
    }

    /// Go back one step. Not possible after submitting.
    pub fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Details | WizardStep::Description => WizardStep::Details,
            WizardStep::Evidence => WizardStep::Description,
            WizardStep::Confirmation => WizardStep::Confirmation,
        };
        self.step
    }

    /// Attach an evidence reference (a file name or link).
    pub fn add_evidence(&mut self, reference: &str) -> ClientResult<()> {
        if self.step != WizardStep::Evidence {
            return Err(ClientError::validation("Evidence is added on step 3"));
        }
        let reference = reference.trim();
        if reference.is_empty() || reference.chars().count() > MAX_EVIDENCE_LEN {
            return Err(ClientError::validation(format!(
                "Evidence references must be 1 to {MAX_EVIDENCE_LEN} characters"
            )));
        }
        if self.draft.evidence.len() >= MAX_EVIDENCE {
            return Err(ClientError::validation(format!(
                "At most {MAX_EVIDENCE} evidence items"
            )));
        }
        self.draft.evidence.push(reference.to_string());
        Ok(())
    }

    pub fn remove_evidence(&mut self, index: usize) -> Option<String> {
        (self.step == WizardStep::Evidence && index < self.draft.evidence.len())
            .then(|| self.draft.evidence.remove(index))
    }

    /// Submit from step 3 and move to the confirmation step.
    pub async fn submit(&mut self, api: &dyn PortalApi, token: &str) -> ClientResult<&str> {
        if self.step != WizardStep::Evidence {
            return Err(ClientError::validation("Complete steps 1 and 2 first"));
        }
        self.draft.check_details()?;
        self.draft.check_description()?;

        let submitted = api.submit_complaint(token, &self.draft.to_request()).await?;
        info!(complaint_id = %submitted.complaint_id, "Complaint submitted");

        self.step = WizardStep::Confirmation;
        Ok(self.complaint_id.insert(submitted.complaint_id).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ComplaintWizard {
        let mut wizard = ComplaintWizard::new();
        let draft = wizard.draft_mut().unwrap();
        draft.category = "Financial Fraud".to_string();
        draft.subcategory = "UPI Fraud".to_string();
        draft.title = "Money taken over UPI".to_string();
        wizard
    }

    #[test]
    fn test_step_one_requires_all_fields() {
        for field in ["category", "subcategory", "title"] {
            let mut wizard = filled();
            let draft = wizard.draft_mut().unwrap();
            match field {
                "category" => draft.category.clear(),
                "subcategory" => draft.subcategory = "   ".to_string(),
                _ => draft.title.clear(),
            }

            assert!(wizard.next().is_err(), "missing {field}");
            assert_eq!(wizard.step(), WizardStep::Details);
        }

        let mut wizard = filled();
        assert_eq!(wizard.next().unwrap(), WizardStep::Description);
        assert_eq!(wizard.step().number(), 2);
    }

    #[test]
    fn test_step_two_requires_description() {
        let mut wizard = filled();
        wizard.next().unwrap();
        assert!(wizard.next().is_err());
        assert_eq!(wizard.step(), WizardStep::Description);

        wizard.draft_mut().unwrap().description = "Caller posed as bank staff".to_string();
        wizard.draft_mut().unwrap().financial_loss = Some(-1.0);
        assert!(wizard.next().is_err());

        wizard.draft_mut().unwrap().financial_loss = Some(2500.0);
        assert_eq!(wizard.next().unwrap(), WizardStep::Evidence);
    }

    #[test]
    fn test_evidence_only_on_step_three() {
        let mut wizard = filled();
        assert!(wizard.add_evidence("receipt.png").is_err());

        wizard.next().unwrap();
        wizard.draft_mut().unwrap().description = "details".to_string();
        wizard.next().unwrap();

        wizard.add_evidence("receipt.png").unwrap();
        assert!(wizard.add_evidence("  ").is_err());
        assert_eq!(wizard.draft().evidence, vec!["receipt.png"]);
        assert_eq!(wizard.remove_evidence(0).as_deref(), Some("receipt.png"));
    }

    #[test]
    fn test_back() {
        let mut wizard = filled();
        wizard.next().unwrap();
        assert_eq!(wizard.back(), WizardStep::Details);
        assert_eq!(wizard.back(), WizardStep::Details);
    }
}
