use crate::error::AppError;
use crate::models::{NewStudent, Student};

pub const MISSING_FIELDS: &str = "Please fill all fields.";
pub const BAD_NUMBERS: &str = "Age must be integer and Score must be a positive number.";

/// Editable fields of the student form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Age,
    Class,
    Score,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Name,
        FormField::Age,
        FormField::Class,
        FormField::Score,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Age => "Age",
            FormField::Class => "Class",
            FormField::Score => "Score",
        }
    }
}

/// Raw text typed into the four input fields. Nothing here is validated until
/// `parse_inputs` runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StudentForm {
    pub name: String,
    pub age: String,
    pub class_name: String,
    pub score: String,
}

impl StudentForm {
    /// Copy the editable fields of an existing student into the form.
    pub fn from_student(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            age: student.age.to_string(),
            class_name: student.class_name.clone(),
            score: student.score.to_string(),
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Age => &self.age,
            FormField::Class => &self.class_name,
            FormField::Score => &self.score,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::Age => &mut self.age,
            FormField::Class => &mut self.class_name,
            FormField::Score => &mut self.score,
        }
    }

    /// Append a character to `field`. Control characters are rejected.
    pub fn push_char(&mut self, field: FormField, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.value_mut(field).push(ch);
        true
    }

    pub fn backspace(&mut self, field: FormField) {
        self.value_mut(field).pop();
    }

    /// Character count of `field`, used for cursor placement.
    pub fn value_len(&self, field: FormField) -> usize {
        self.value(field).chars().count()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Validate the inputs and return typed values ready for persistence.
    /// Every field must be non-blank after trimming, age a non-negative
    /// integer and score a finite non-negative number.
    pub fn parse_inputs(&self) -> Result<NewStudent, AppError> {
        let name = self.name.trim();
        let age = self.age.trim();
        let class_name = self.class_name.trim();
        let score = self.score.trim();

        if name.is_empty() || age.is_empty() || class_name.is_empty() || score.is_empty() {
            return Err(AppError::Validation(MISSING_FIELDS.to_string()));
        }

        let age = age
            .parse::<i64>()
            .ok()
            .filter(|value| *value >= 0)
            .ok_or_else(|| AppError::Validation(BAD_NUMBERS.to_string()))?;
        let score = score
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| AppError::Validation(BAD_NUMBERS.to_string()))?;

        Ok(NewStudent::new(name, age, class_name, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, age: &str, class_name: &str, score: &str) -> StudentForm {
        StudentForm {
            name: name.to_string(),
            age: age.to_string(),
            class_name: class_name.to_string(),
            score: score.to_string(),
        }
    }

    fn message(result: Result<NewStudent, AppError>) -> String {
        match result {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn trims_and_parses_valid_input() {
        let parsed = form("  Ada ", " 20", "CS1 ", " 95.5 ").parse_inputs().unwrap();

        assert_eq!(parsed, NewStudent::new("Ada", 20, "CS1", 95.5));
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(message(form("   ", "20", "CS1", "1").parse_inputs()), MISSING_FIELDS);
        assert_eq!(message(form("Ada", "", "CS1", "1").parse_inputs()), MISSING_FIELDS);
        assert_eq!(message(form("Ada", "20", " ", "1").parse_inputs()), MISSING_FIELDS);
        assert_eq!(message(form("Ada", "20", "CS1", "").parse_inputs()), MISSING_FIELDS);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        for (age, score) in [
            ("-1", "1"),
            ("twenty", "1"),
            ("20.5", "1"),
            ("20", "-0.5"),
            ("20", "abc"),
            ("20", "NaN"),
            ("20", "inf"),
        ] {
            assert_eq!(
                message(form("Ada", age, "CS1", score).parse_inputs()),
                BAD_NUMBERS,
                "age={age} score={score}"
            );
        }
    }

    #[test]
    fn zero_is_allowed() {
        let parsed = form("Baby", "0", "K", "0").parse_inputs().unwrap();

        assert_eq!(parsed.age, 0);
        assert_eq!(parsed.score, 0.0);
    }

    #[test]
    fn ages_beyond_32_bits_are_accepted() {
        let parsed = form("Old", "4294967296", "K", "1").parse_inputs().unwrap();

        assert_eq!(parsed.age, 4_294_967_296);
        assert_eq!(
            message(form("Old", "99999999999999999999", "K", "1").parse_inputs()),
            BAD_NUMBERS
        );
    }

    #[test]
    fn editing_helpers_target_one_field() {
        let mut form = StudentForm::default();
        assert!(form.push_char(FormField::Age, '4'));
        assert!(form.push_char(FormField::Age, '2'));
        assert!(!form.push_char(FormField::Age, '\n'));
        form.backspace(FormField::Age);

        assert_eq!(form.age, "4");
        assert_eq!(form.value_len(FormField::Age), 1);
        assert!(form.name.is_empty());
    }
}
