//! Staged deduction pipeline over a [`RateProvider`].
//!
//! A calculation runs in three stages:
//!
//! 1. Health, employment and pension lookups run concurrently.
//! 2. Withholding tax is looked up for the salary minus the enabled
//!    contributions from stage 1.
//! 3. The amounts are aggregated into a [`CalculationResult`].
//!
//! Every lookup is bounded by the pipeline's timeout. Dropping the future
//! returned by [`DeductionPipeline::calculate`] cancels all in-flight lookups.
//!
//! ## Failures
//!
//! A failed lookup for an enabled category fails the calculation with
//! `CalculationFailure`. A failed lookup for a disabled category is reported
//! as a zero line with a `CATEGORY_UNAVAILABLE` warning. If the stage 2 tax
//! lookup fails, the tax on the gross salary reported in stage 1 is used
//! instead, marked `approximated`, with a `TAX_APPROXIMATED` warning.

use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{AggregationContext, DeductionLines, aggregate, taxable_income};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AgeCategory, AuditStep, AuditWarning, CalculationResult, ContributionLine, DeductionInput,
    IncomeTaxLine, WARNING_CATEGORY_UNAVAILABLE, WARNING_TAX_APPROXIMATED,
};
use crate::provider::{
    CATEGORY_EMPLOYMENT, CATEGORY_HEALTH, CATEGORY_INCOME_TAX, CATEGORY_PENSION, RateProvider,
    RateQuery,
};

/// Runs calculations against a rate provider.
///
/// # Example
///
/// ```
/// use deduction_engine::config::{ConfigLoader, DEFAULT_LOOKUP_TIMEOUT};
/// use deduction_engine::models::DeductionInput;
/// use deduction_engine::pipeline::DeductionPipeline;
/// use deduction_engine::provider::TableRateProvider;
/// use rust_decimal::Decimal;
/// use std::sync::Arc;
///
/// let config = Arc::new(ConfigLoader::embedded().unwrap());
/// let pipeline = DeductionPipeline::new(
///     Arc::new(TableRateProvider::new(config)),
///     DEFAULT_LOOKUP_TIMEOUT,
/// );
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let result = runtime
///     .block_on(pipeline.calculate(&DeductionInput::new(Decimal::from(300_000), 35)))
///     .unwrap();
/// assert_eq!(result.net_payment, Decimal::from(249_270));
/// ```
#[derive(Clone)]
pub struct DeductionPipeline {
    provider: Arc<dyn RateProvider>,
    lookup_timeout: Duration,
}

impl std::fmt::Debug for DeductionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeductionPipeline")
            .field("provider", &self.provider.name())
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

impl DeductionPipeline {
    /// Creates a pipeline with a time budget for each lookup.
    pub fn new(provider: Arc<dyn RateProvider>, lookup_timeout: Duration) -> Self {
        Self {
            provider,
            lookup_timeout,
        }
    }

    /// The provider lookups go to.
    pub fn provider(&self) -> &dyn RateProvider {
        self.provider.as_ref()
    }

    /// The time budget of each lookup.
    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    /// Calculates all deductions for one input.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the input fails validation
    /// - `CalculationFailure` if a lookup for an enabled category fails and
    ///   no fallback applies
    pub async fn calculate(&self, input: &DeductionInput) -> EngineResult<CalculationResult> {
        let started = Instant::now();
        input.validate()?;

        let calculation_id = Uuid::new_v4();
        let options = input.options;
        let query = RateQuery::from_input(input);
        let mut steps: Vec<AuditStep> = Vec::new();
        let mut warnings: Vec<AuditWarning> = Vec::new();

        info!(
            %calculation_id,
            salary = %input.salary,
            age_category = AgeCategory::from_age(input.age).as_str(),
            provider = self.provider.name(),
            "Starting deduction calculation"
        );

        // Stage 1
        let (health, employment, pension) = tokio::join!(
            self.lookup(CATEGORY_HEALTH, self.provider.health_insurance(&query)),
            self.lookup(CATEGORY_EMPLOYMENT, self.provider.employment_insurance(&query)),
            self.lookup(CATEGORY_PENSION, self.provider.pension_insurance(&query)),
        );

        let health = gate(calculation_id, CATEGORY_HEALTH, options.enable_social, health, &mut warnings)?;
        let employment = gate(
            calculation_id,
            CATEGORY_EMPLOYMENT,
            options.enable_employment,
            employment,
            &mut warnings,
        )?;
        let pension = gate(calculation_id, CATEGORY_PENSION, options.enable_social, pension, &mut warnings)?;

        let (standard_remuneration, health_line, nursing_care, gross_income_tax) = match health {
            Some(quote) => {
                steps.extend(quote.audit_steps);
                (
                    quote.standard_remuneration,
                    quote.health,
                    quote.nursing_care,
                    quote.gross_income_tax,
                )
            }
            None => (
                Decimal::ZERO,
                ContributionLine::zero(),
                ContributionLine::zero(),
                None,
            ),
        };
        let (standard_remuneration_pension, pension_line) = match pension {
            Some(quote) => {
                steps.extend(quote.audit_steps);
                (quote.pension_standard, quote.pension)
            }
            None => (Decimal::ZERO, ContributionLine::zero()),
        };
        let employment_line = match employment {
            Some(quote) => {
                steps.extend(quote.audit_steps);
                quote.employment
            }
            None => ContributionLine::zero(),
        };

        debug!(
            %calculation_id,
            health = %health_line.employee,
            pension = %pension_line.employee,
            employment = %employment_line.employee,
            "Stage 1 complete"
        );

        // Stage 2
        let taxable = taxable_income(
            input.salary,
            &health_line,
            &pension_line,
            &employment_line,
            &options,
        );
        let tax = self
            .lookup(
                CATEGORY_INCOME_TAX,
                self.provider.withholding_tax(&query.with_amount(taxable)),
            )
            .await;

        let income_tax = match (tax, gross_income_tax) {
            (Ok(quote), _) => {
                steps.extend(quote.audit_steps);
                quote.income_tax
            }
            // A disabled tax is never approximated.
            (Err(err), Some(baseline)) if options.enable_tax => {
                warn!(%calculation_id, error = %err, "Tax lookup failed, using tax on gross salary");
                warnings.push(AuditWarning::new(
                    WARNING_TAX_APPROXIMATED,
                    format!(
                        "Income tax on {} could not be looked up ({}); using the tax on the gross salary of {}",
                        taxable, err, baseline.taxable_income
                    ),
                    "medium",
                ));
                IncomeTaxLine {
                    approximated: true,
                    ..baseline
                }
            }
            (Err(err), _) => {
                match gate::<IncomeTaxLine>(
                    calculation_id,
                    CATEGORY_INCOME_TAX,
                    options.enable_tax,
                    Err(err),
                    &mut warnings,
                )? {
                    Some(line) => line,
                    None => IncomeTaxLine {
                        taxable_income: taxable,
                        ..IncomeTaxLine::zero()
                    },
                }
            }
        };

        for (i, step) in steps.iter_mut().enumerate() {
            step.step_number = i as u32 + 1;
        }

        // Stage 3
        let result = aggregate(
            AggregationContext {
                calculation_id,
                scheme_code: self.provider.scheme_code().to_string(),
                input: input.clone(),
                standard_remuneration,
                standard_remuneration_pension,
            },
            DeductionLines {
                health: health_line,
                nursing_care,
                pension: pension_line,
                employment: employment_line,
                income_tax,
            },
            steps,
            warnings,
            started,
        );

        if result.has_negative_net_payment() {
            warn!(%calculation_id, net_payment = %result.net_payment, "Deductions exceed salary");
        }
        info!(
            %calculation_id,
            total_deduction = %result.total_deduction,
            net_payment = %result.net_payment,
            duration_us = result.audit_trace.duration_us,
            "Deduction calculation complete"
        );

        Ok(result)
    }

    async fn lookup<T>(
        &self,
        source: &str,
        lookup: impl Future<Output = EngineResult<T>>,
    ) -> EngineResult<T> {
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::LookupTimeout {
                source_name: source.to_string(),
                timeout_ms: self.lookup_timeout.as_millis() as u64,
            }),
        }
    }
}

/// Applies the failure policy to one category's lookup.
///
/// Returns the value on success, `None` with a warning when a disabled
/// category failed, and `CalculationFailure` when an enabled one did.
fn gate<T>(
    calculation_id: Uuid,
    category: &str,
    enabled: bool,
    result: EngineResult<T>,
    warnings: &mut Vec<AuditWarning>,
) -> EngineResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if enabled => {
            warn!(%calculation_id, category, error = %err, "Lookup failed for enabled category");
            Err(EngineError::calculation_failure(category, err))
        }
        Err(err) => {
            debug!(%calculation_id, category, error = %err, "Lookup failed for disabled category");
            warnings.push(AuditWarning::new(
                WARNING_CATEGORY_UNAVAILABLE,
                format!("{} is unavailable and shown as zero: {}", category, err),
                "low",
            ));
            Ok(None)
        }
    }
}
