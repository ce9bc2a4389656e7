pub mod enums;
pub mod error;
pub mod i18n;
pub mod identifier;
pub mod prefetch;
pub mod prefill;
pub mod question;
pub mod rule;
pub mod survey;

pub use enums::{QuestionType, SurveyStatus};
pub use error::{ModelError, Result};
pub use i18n::{
    TranslationOption, TranslationQuestion, TranslationQuestionColumn, TranslationQuestionRow,
    TranslationStatus, TranslationSurvey,
};
pub use identifier::{is_identifier, is_option_value};
pub use prefetch::SurveyPrefetch;
pub use prefill::PrefillPolicy;
pub use question::{ChoiceOption, Question, QuestionColumn, QuestionRow};
pub use rule::{Rule, RuleType};
pub use survey::Survey;
