//! Client-side search over lists that are already loaded.

use crate::models::{MedicalImage, MedicalStaff, Patient};

/// Normalized search term; `None` means "match everything".
fn normalize(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() { None } else { Some(term.to_lowercase()) }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn contains_opt(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| contains(h, needle))
}

/// Whether a patient matches on name, email, address or date of birth.
pub fn patient_matches(patient: &Patient, term: &str) -> bool {
    let Some(needle) = normalize(term) else {
        return true;
    };

    contains(&patient.full_name(), &needle)
        || contains(&patient.email, &needle)
        || contains_opt(patient.address.as_deref(), &needle)
        || patient
            .date_of_birth
            .is_some_and(|dob| dob.format("%Y-%m-%d").to_string().contains(&needle))
}

/// Patients matching `term`, in their original order.
pub fn filter_patients<'a>(patients: &'a [Patient], term: &str) -> Vec<&'a Patient> {
    patients.iter().filter(|p| patient_matches(p, term)).collect()
}

/// Whether an image matches on id, image type or tag.
pub fn image_matches(image: &MedicalImage, term: &str) -> bool {
    let Some(needle) = normalize(term) else {
        return true;
    };

    image.id.to_string().contains(&needle)
        || contains_opt(image.image_type.as_deref(), &needle)
        || contains_opt(image.tag.as_deref(), &needle)
}

/// Images matching `term`, in their original order.
pub fn filter_images<'a>(images: &'a [MedicalImage], term: &str) -> Vec<&'a MedicalImage> {
    images.iter().filter(|i| image_matches(i, term)).collect()
}

/// Staff matching on name, email or specialization.
pub fn filter_staff<'a>(staff: &'a [MedicalStaff], term: &str) -> Vec<&'a MedicalStaff> {
    let Some(needle) = normalize(term) else {
        return staff.iter().collect();
    };

    staff
        .iter()
        .filter(|s| {
            contains(&s.full_name(), &needle)
                || contains(&s.email, &needle)
                || contains_opt(s.specialization.as_deref(), &needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Role;
    use chrono::NaiveDate;

    fn patient(id: i64, first: &str, last: &str, email: &str, address: Option<&str>, dob: Option<(i32, u32, u32)>) -> Patient {
        Patient {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone_number: None,
            address: address.map(str::to_string),
            date_of_birth: dob.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            gender: None,
            blood_type: None,
            emergency_contact: None,
            user_id: None,
        }
    }

    fn image(id: i64, image_type: Option<&str>, tag: Option<&str>) -> MedicalImage {
        MedicalImage {
            id,
            patient_id: 1,
            image_type: image_type.map(str::to_string),
            body_part: Some("Chest".to_string()),
            tag: tag.map(str::to_string),
            file_name: None,
            content_type: None,
            description: None,
            uploaded_by: None,
            uploaded_at: None,
        }
    }

    fn sample_patients() -> Vec<Patient> {
        vec![
            patient(1, "Alice", "Smith", "alice@example.org", Some("12 Oak Street"), Some((1985, 2, 14))),
            patient(2, "Bob", "Jones", "bob@clinic.net", None, None),
            patient(3, "Carol", "Oakley", "carol@example.org", Some("4 Pine Road"), Some((1990, 7, 1))),
        ]
    }

    fn ids(list: &[&Patient]) -> Vec<i64> {
        list.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_empty_term_returns_all() {
        let patients = sample_patients();
        assert_eq!(ids(&filter_patients(&patients, "")), vec![1, 2, 3]);
        assert_eq!(ids(&filter_patients(&patients, "   ")), vec![1, 2, 3]);
    }

    #[test]
    fn test_name_match_case_insensitive() {
        let patients = sample_patients();
        assert_eq!(ids(&filter_patients(&patients, "ALICE")), vec![1]);
        assert_eq!(ids(&filter_patients(&patients, "bob jones")), vec![2]);
    }

    #[test]
    fn test_match_across_name_and_address() {
        let patients = sample_patients();
        // "oak" hits Alice's address and Carol's last name
        assert_eq!(ids(&filter_patients(&patients, "oak")), vec![1, 3]);
    }

    #[test]
    fn test_email_match() {
        let patients = sample_patients();
        assert_eq!(ids(&filter_patients(&patients, "clinic.net")), vec![2]);
        assert_eq!(ids(&filter_patients(&patients, "example.org")), vec![1, 3]);
    }

    #[test]
    fn test_date_of_birth_match() {
        let patients = sample_patients();
        assert_eq!(ids(&filter_patients(&patients, "1990-07")), vec![3]);
        assert_eq!(ids(&filter_patients(&patients, "02-14")), vec![1]);
    }

    #[test]
    fn test_no_match() {
        let patients = sample_patients();
        assert!(filter_patients(&patients, "zzz").is_empty());
    }

    #[test]
    fn test_image_filter_fields() {
        let images = vec![
            image(10, Some("XRAY"), Some("follow-up")),
            image(21, Some("MRI"), None),
            image(32, None, Some("urgent")),
        ];
        let found = |term: &str| filter_images(&images, term).iter().map(|i| i.id).collect::<Vec<_>>();

        assert_eq!(found(""), vec![10, 21, 32]);
        assert_eq!(found("xray"), vec![10]);
        assert_eq!(found("URG"), vec![32]);
        assert_eq!(found("2"), vec![21, 32]);
        // body part is not a searchable field
        assert!(found("chest").is_empty());
    }

    #[test]
    fn test_staff_filter() {
        let staff = vec![MedicalStaff {
            id: 1,
            first_name: "Meredith".to_string(),
            last_name: "Grey".to_string(),
            email: "grey@example.org".to_string(),
            role: Role::Doctor,
            phone_number: None,
            specialization: Some("General Surgery".to_string()),
            department: None,
            license_number: None,
            user_id: None,
        }];
        assert_eq!(filter_staff(&staff, "surgery").len(), 1);
        assert_eq!(filter_staff(&staff, "grey").len(), 1);
        assert!(filter_staff(&staff, "cardio").is_empty());
    }
}
