//! Narration composer
//!
//! Runs the enabled analyzers once each, in a fixed section order, and hands
//! the rendered sections to a serializer:
//!
//! overview, date_range, range, change, regime, indicators, symbolic,
//! patterns, candlestick, levels
//!
//! Any analyzer failure aborts the whole narration; no partial text is
//! returned.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{
        analyze_indicators, analyze_regime, analyze_summary, astride_encode, describe_astride,
        describe_candlestick, describe_indicators, describe_patterns, describe_regime, describe_sax,
        describe_summary, describe_support_resistance, detect_patterns, find_support_resistance,
        sax_encode,
    },
    backends::Capabilities,
    format::{digit_tokenize, format_sections, OutputFormat, Sections},
    frame::Frame,
    params::{AstrideParams, IndicatorParams, LevelParams, PatternParams, RegimeParams, SaxParams},
    sparkline::make_sparkline,
    NarrataError, Period, Result,
};

/// Encoding used for the symbolic section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolicMethod {
    /// Fixed-length word, always available
    #[default]
    Sax,
    /// Change-point aligned word; needs a change-point backend
    Astride,
}

// ============================================================
// OPTIONS
// ============================================================

/// Composer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrateOptions {
    pub column: String,
    /// Overrides the frame's own ticker in header text
    pub ticker: Option<String>,
    pub include_summary: bool,
    pub include_sparkline: bool,
    pub include_regime: bool,
    pub include_indicators: bool,
    pub include_symbolic: bool,
    pub include_patterns: bool,
    pub include_support_resistance: bool,
    pub sparkline_width: usize,
    /// SAX word size, or the ASTRIDE segment hint
    pub symbolic_word_size: usize,
    pub symbolic_alphabet_size: usize,
    pub symbolic_method: SymbolicMethod,
    pub digit_level: bool,
    pub output_format: OutputFormat,
    pub currency_symbol: String,
    pub precision: usize,
    pub indicator_params: IndicatorParams,
    pub regime_params: RegimeParams,
    /// Penalty for ASTRIDE; segment count and alphabet come from the
    /// `symbolic_*` fields
    pub astride_params: AstrideParams,
    pub pattern_params: PatternParams,
    pub level_params: LevelParams,
}

impl Default for NarrateOptions {
    fn default() -> Self {
        Self {
            column: "Close".to_string(),
            ticker: None,
            include_summary: true,
            include_sparkline: true,
            include_regime: true,
            include_indicators: true,
            include_symbolic: true,
            include_patterns: true,
            include_support_resistance: true,
            sparkline_width: 20,
            symbolic_word_size: 16,
            symbolic_alphabet_size: 8,
            symbolic_method: SymbolicMethod::Sax,
            digit_level: false,
            output_format: OutputFormat::Plain,
            currency_symbol: "$".to_string(),
            precision: 2,
            indicator_params: IndicatorParams::default(),
            regime_params: RegimeParams::default(),
            astride_params: AstrideParams::default(),
            pattern_params: PatternParams::default(),
            level_params: LevelParams::default(),
        }
    }
}

macro_rules! setters {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(mut self, value: $ty) -> Self {
                self.$name = value;
                self
            }
        )*
    };
}

impl NarrateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every section switched off; enable the wanted ones afterwards.
    pub fn none() -> Self {
        Self {
            include_summary: false,
            include_sparkline: false,
            include_regime: false,
            include_indicators: false,
            include_symbolic: false,
            include_patterns: false,
            include_support_resistance: false,
            ..Self::default()
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    setters! {
        include_summary: bool,
        include_sparkline: bool,
        include_regime: bool,
        include_indicators: bool,
        include_symbolic: bool,
        include_patterns: bool,
        include_support_resistance: bool,
        sparkline_width: usize,
        symbolic_word_size: usize,
        symbolic_alphabet_size: usize,
        symbolic_method: SymbolicMethod,
        digit_level: bool,
        output_format: OutputFormat,
        precision: usize,
        indicator_params: IndicatorParams,
        regime_params: RegimeParams,
        astride_params: AstrideParams,
        pattern_params: PatternParams,
        level_params: LevelParams,
    }

    fn any_section(&self) -> bool {
        self.include_summary
            || self.include_sparkline
            || self.include_regime
            || self.include_indicators
            || self.include_symbolic
            || self.include_patterns
            || self.include_support_resistance
    }
}

// ============================================================
// COMPOSER
// ============================================================

/// Narrate with the process-wide backends.
pub fn narrate(frame: &Frame, options: &NarrateOptions) -> Result<String> {
    narrate_with(frame, options, Capabilities::shared())
}

/// Narrate with an explicit set of backends.
pub fn narrate_with(frame: &Frame, options: &NarrateOptions, caps: &Capabilities) -> Result<String> {
    render(&compose(frame, options, caps, None)?, options)
}

/// Rendered sections before serialization, in narration order.
pub fn narrate_sections(frame: &Frame, options: &NarrateOptions, caps: &Capabilities) -> Result<Sections> {
    compose(frame, options, caps, None)
}

fn render(sections: &Sections, options: &NarrateOptions) -> Result<String> {
    let text = format_sections(sections, options.output_format);
    Ok(if options.digit_level {
        digit_tokenize(&text, true)
    } else {
        text
    })
}

fn compose(
    frame: &Frame,
    options: &NarrateOptions,
    caps: &Capabilities,
    fallback_ticker: Option<&str>,
) -> Result<Sections> {
    let column = options.column.as_str();
    frame.column(column)?;
    if !options.any_section() {
        return Err(NarrataError::validation(
            "At least one narration component must be enabled.",
        ));
    }

    let currency = options.currency_symbol.as_str();
    let precision = options.precision;
    let ticker = options.ticker.as_deref().or(frame.ticker()).or(fallback_ticker);
    let summary = analyze_summary(frame, column, ticker)?;
    let mut sections = Sections::new();

    if options.include_summary || options.include_sparkline {
        let header = format!("{} ({} pts, {})", summary.entity_name(), summary.points, summary.frequency);
        if options.include_sparkline {
            let values = frame.series(column)?.values;
            if values.is_empty() {
                return Err(NarrataError::validation(format!(
                    "Column '{column}' contains no numeric values for sparkline rendering."
                )));
            }
            let spark = make_sparkline(&values, options.sparkline_width)?;
            sections.insert("overview", format!("{header}: {spark}"));
        } else {
            sections.insert("overview", header);
        }
    }

    if options.include_summary {
        sections.insert(
            "date_range",
            format!(
                "Date range: {} to {}",
                summary.start_date.format("%Y-%m-%d"),
                summary.end_date.format("%Y-%m-%d")
            ),
        );
        let text = describe_summary(&summary, currency, precision, false);
        let mut lines = text.lines();
        sections.insert("range", lines.next().unwrap_or_default());
        sections.insert("change", lines.next().unwrap_or_default());
    }

    if options.include_regime {
        let stats = analyze_regime(frame, column, &options.regime_params, caps)?;
        sections.insert("regime", describe_regime(&stats));
    }

    if options.include_indicators {
        let stats = analyze_indicators(frame, column, &options.indicator_params, caps)?;
        sections.insert("indicators", describe_indicators(&stats));
    }

    if options.include_symbolic {
        let word_size = Period::new(options.symbolic_word_size)?;
        let alphabet_size = Period::new(options.symbolic_alphabet_size)?;
        let line = match options.symbolic_method {
            SymbolicMethod::Sax => {
                let params = SaxParams { word_size, alphabet_size };
                describe_sax(&sax_encode(frame, column, &params, caps)?)
            }
            SymbolicMethod::Astride => {
                let params = AstrideParams {
                    n_segments: word_size,
                    alphabet_size,
                    ..options.astride_params
                };
                describe_astride(&astride_encode(frame, column, &params, caps)?)
            }
        };
        sections.insert("symbolic", line);
    }

    if options.include_patterns {
        let stats = detect_patterns(frame, &options.pattern_params, caps)?;
        sections.insert("patterns", describe_patterns(&stats));
        sections.insert("candlestick", describe_candlestick(&stats));
    }

    if options.include_support_resistance {
        let stats = find_support_resistance(frame, column, &options.level_params)?;
        sections.insert("levels", describe_support_resistance(&stats, currency, precision));
    }

    tracing::trace!(
        sections = ?sections.keys().collect::<Vec<_>>(),
        entity = summary.entity_name(),
        "narration composed"
    );
    Ok(sections)
}

// ============================================================
// PARALLEL NARRATION
// ============================================================

/// Narration of one instrument
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub symbol: String,
    pub text: String,
}

/// Failure narrating one instrument
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationError {
    pub symbol: String,
    pub error: NarrataError,
}

/// Narrate many instruments in parallel with the process-wide backends.
///
/// The symbol is used as the ticker for frames that carry none and when the
/// options do not set one. Output order follows input order.
pub fn narrate_parallel<'a, I>(instruments: I, options: &NarrateOptions) -> (Vec<Narration>, Vec<NarrationError>)
where
    I: IntoParallelIterator<Item = (&'a str, &'a Frame)>,
{
    let caps = Capabilities::shared();
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, frame)| {
            compose(frame, options, caps, Some(symbol))
                .and_then(|sections| render(&sections, options))
                .map(|text| Narration {
                    symbol: symbol.to_string(),
                    text,
                })
                .map_err(|error| NarrationError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(n) => successes.push(n),
            Err(e) => {
                tracing::debug!(symbol = %e.symbol, error = %e.error, "narration failed");
                errors.push(e);
            }
        }
    }
    (successes, errors)
}
