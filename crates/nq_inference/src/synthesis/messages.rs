//! User-facing fallback strings. The deployment serves an Arabic-speaking
//! audience; these are the only strings shown when synthesis cannot produce
//! an answer, so callers can rely on always receiving text.

pub const NO_RELEVANT_ARTICLES: &str =
    "عذراً، لم أجد أي مقالات ذات صلة بسؤالك. يرجى المحاولة مرة أخرى لاحقاً أو طرح سؤال مختلف.";

pub const QA_FAILED: &str = "عذراً، حدث خطأ في معالجة السؤال. يرجى المحاولة مرة أخرى.";

pub const NO_RECENT_NEWS: &str = "لم يتم العثور على أخبار للأيام الماضية. يرجى المحاولة لاحقاً.";

pub const DIGEST_FAILED: &str = "عذراً، حدث خطأ في إنشاء الملخص. يرجى المحاولة مرة أخرى.";
