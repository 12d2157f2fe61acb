use crate::types::Info;
use crate::validate::validator::Validator;

pub(crate) fn validate_info(v: &mut Validator<'_>, info: &Info) {
    if info.title.trim().is_empty() {
        v.push("$.info", "title", "must not be empty");
    }
    if info.version.trim().is_empty() {
        v.push("$.info", "version", "must not be empty");
    }
}
