//! Bundled development dataset: five users and five jobs spanning the
//! lifecycle. Stands in for a live backend during local development and
//! seeds `valpro init`.

use crate::job::{
    default_inspection_tasks, Bid, Document, InspectionPointData, Job, PaymentInfo, PayoutInfo,
    Review, Signature, Signatures,
};
use crate::types::{
    CarType, CertificationStatus, InspectionPoint, JobStatus, SubscriptionTier, UserType,
};
use crate::user::{Certification, Party, User};
use crate::vehicle::{Location, Vehicle};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn party(users: &[User], id: &str) -> Party {
    users
        .iter()
        .find(|u| u.id == id)
        .map(Party::from)
        .unwrap_or_else(|| Party {
            id: id.to_string(),
            name: id.to_string(),
        })
}

fn signature(users: &[User], id: &str, at: DateTime<Utc>) -> Signature {
    let p = party(users, id);
    Signature {
        signature_url: format!("/signatures/{}.png", p.id),
        user_id: p.id,
        user_name: p.name,
        signed_at: at,
    }
}

fn vehicle(
    make: &str,
    model: &str,
    year: i32,
    vin: &str,
    seed: &str,
    car_type: CarType,
    (lat, lng, address): (f64, f64, &str),
) -> Vehicle {
    Vehicle {
        make: make.into(),
        model: model.into(),
        year,
        vin: vin.into(),
        image_url: format!("https://picsum.photos/seed/{seed}/800/600"),
        car_type: Some(car_type),
        location: Location {
            lat,
            lng,
            address: address.into(),
        },
    }
}

fn paid(amount: u64, at: DateTime<Utc>) -> Option<PaymentInfo> {
    Some(PaymentInfo {
        amount,
        paid: true,
        paid_at: Some(at),
    })
}

pub fn users() -> Vec<User> {
    let alice = User::new("user-1", "Alice Johnson", "alice.j@example.com", UserType::Client);

    let mut vance = User::new(
        "user-2",
        "Vance Refrigeration",
        "contact@vancerefrigeration.com",
        UserType::Company,
    );
    vance.company_name = Some("Vance Refrigeration".into());

    let mut charlie = User::new("user-3", "Charlie Davis", "charlie.d@example.com", UserType::Valuer);
    charlie.location = Some("Nairobi County, Kenya".into());
    charlie.rating = Some(4.8);
    charlie.jobs_completed = Some(25);
    charlie.subscription_tier = Some(SubscriptionTier::Pro);
    charlie.specializations = vec!["Classic Cars".into(), "Exotics".into(), "EVs".into()];
    charlie.bids_this_month = Some(5);
    charlie.signature_url = Some("/signature-charlie.png".into());
    charlie.verified = true;
    charlie.certifications = vec![
        Certification {
            status: CertificationStatus::Verified,
            ..Certification::pending(
                "Certified Vehicle Appraiser",
                "Auto Appraisal Network",
                "2020-05-15",
            )
        },
        Certification {
            status: CertificationStatus::Verified,
            ..Certification::pending("EV Valuation Specialist", "EV Institute", "2022-01-20")
        },
    ];

    let diana = User::new("user-4", "Diana Prince", "diana.p@example.com", UserType::Admin);

    let mut eve = User::new("user-5", "Eve Adams", "eve.a@example.com", UserType::Valuer);
    eve.location = Some("Lagos State, Nigeria".into());
    eve.rating = Some(4.5);
    eve.jobs_completed = Some(12);
    eve.subscription_tier = Some(SubscriptionTier::Free);
    eve.specializations = vec!["Trucks".into(), "Motorcycles".into()];
    eve.bids_this_month = Some(1);
    eve.certifications = vec![Certification {
        document_url: Some("#".into()),
        ..Certification::pending(
            "Heavy Commercial Vehicle Certification",
            "Trucking Association of Nigeria",
            "2021-08-10",
        )
    }];

    vec![alice, vance, charlie, diana, eve]
}

pub fn jobs() -> Vec<Job> {
    let users = users();

    let mut in_progress_tasks = default_inspection_tasks();
    for task in in_progress_tasks.iter_mut().take(2) {
        task.completed = true;
    }

    let in_progress = Job {
        id: "job-12345".into(),
        vehicle: vehicle(
            "Toyota",
            "Camry",
            2021,
            "123VIN456ABC",
            "job-12345",
            CarType::Small,
            (-1.286389, 36.817223, "Nairobi, Kenya"),
        ),
        client: party(&users, "user-1"),
        valuer: Some(party(&users, "user-3")),
        status: JobStatus::InProgress,
        created_at: date(2023, 10, 26),
        open_bidding: false,
        report_url: None,
        report_outdated: false,
        photos: vec![
            "https://picsum.photos/seed/photo1/400/300".into(),
            "https://picsum.photos/seed/photo2/400/300".into(),
        ],
        videos: Vec::new(),
        documents: vec![Document {
            name: "Vehicle_Registration.pdf".into(),
            url: "#".into(),
            uploaded_by: "Alice Johnson".into(),
            uploaded_at: date(2023, 10, 25),
        }],
        signatures: Signatures::default(),
        bids: Vec::new(),
        notes: Some(
            "Initial inspection shows minor scratches on the rear bumper. Client has been notified."
                .into(),
        ),
        payment_info: paid(4000, date(2023, 10, 26)),
        payout_info: None,
        inspection_tasks: in_progress_tasks,
        interactive_inspection: BTreeMap::from([(
            InspectionPoint::RearBumper,
            InspectionPointData {
                notes: Some("Light scratches near the tow hook".into()),
                ..Default::default()
            },
        )]),
        damage_notes: Some("Minor scratches on the rear bumper".into()),
        ai_damage_report: None,
        comments: Vec::new(),
        next_comment_seq: 0,
        review: None,
    };

    let completed = Job {
        id: "job-67890".into(),
        vehicle: vehicle(
            "Honda",
            "Civic",
            2022,
            "789VIN012DEF",
            "job-67890",
            CarType::Small,
            (40.7128, -74.0060, "New York, NY"),
        ),
        client: party(&users, "user-2"),
        valuer: Some(party(&users, "user-3")),
        status: JobStatus::Completed,
        created_at: date(2023, 9, 15),
        open_bidding: false,
        report_url: Some("https://reports.valpro.ai/job-67890.pdf".into()),
        report_outdated: false,
        photos: vec!["https://picsum.photos/seed/photo3/400/300".into()],
        videos: Vec::new(),
        documents: Vec::new(),
        signatures: Signatures {
            client: Some(signature(&users, "user-2", date(2023, 9, 20))),
            valuer: Some(signature(&users, "user-3", date(2023, 9, 21))),
            admin: Some(signature(&users, "user-4", date(2023, 9, 21))),
        },
        bids: Vec::new(),
        notes: None,
        payment_info: paid(6000, date(2023, 9, 15)),
        payout_info: Some(PayoutInfo {
            amount: 4800,
            paid: true,
            paid_at: date(2023, 9, 22),
            transaction_id: "MPESA-QWERTY123".into(),
        }),
        inspection_tasks: Vec::new(),
        interactive_inspection: BTreeMap::new(),
        damage_notes: None,
        ai_damage_report: None,
        comments: Vec::new(),
        next_comment_seq: 0,
        review: Some(Review {
            rating: 5,
            comment: "Charlie was extremely professional and thorough. The final report was \
                      detailed and delivered on time. Highly recommend!"
                .into(),
            client_name: "Vance Refrigeration".into(),
            created_at: date(2023, 9, 22),
        }),
    };

    let open_with_bid = Job {
        id: "job-ABCDE".into(),
        vehicle: vehicle(
            "Ford",
            "Mustang",
            2023,
            "ABCDEVIN123",
            "job-ABCDE",
            CarType::Big,
            (25.7617, -80.1918, "Miami, FL"),
        ),
        client: party(&users, "user-1"),
        valuer: None,
        status: JobStatus::OpenForBids,
        created_at: date(2023, 10, 28),
        open_bidding: true,
        report_url: None,
        report_outdated: false,
        photos: Vec::new(),
        videos: Vec::new(),
        documents: Vec::new(),
        signatures: Signatures::default(),
        bids: vec![Bid {
            valuer_id: "user-5".into(),
            valuer_name: "Eve Adams".into(),
            amount: 5000,
            created_at: date(2023, 10, 29),
        }],
        notes: None,
        payment_info: paid(6000, date(2023, 10, 28)),
        payout_info: None,
        inspection_tasks: default_inspection_tasks(),
        interactive_inspection: BTreeMap::new(),
        damage_notes: None,
        ai_damage_report: None,
        comments: Vec::new(),
        next_comment_seq: 0,
        review: None,
    };

    let unassigned = Job {
        id: "job-FGHIJ".into(),
        vehicle: vehicle(
            "Tesla",
            "Model 3",
            2023,
            "FGHIJVIN456",
            "job-FGHIJ",
            CarType::Small,
            (37.7749, -122.4194, "Westlands, Nairobi County, Kenya"),
        ),
        client: party(&users, "user-2"),
        valuer: None,
        status: JobStatus::New,
        created_at: date(2023, 10, 29),
        open_bidding: false,
        report_url: None,
        report_outdated: false,
        photos: vec![
            "https://picsum.photos/seed/photo4/400/300".into(),
            "https://picsum.photos/seed/photo5/400/300".into(),
            "https://picsum.photos/seed/photo6/400/300".into(),
        ],
        videos: Vec::new(),
        documents: Vec::new(),
        signatures: Signatures::default(),
        bids: Vec::new(),
        notes: None,
        payment_info: paid(4000, date(2023, 10, 29)),
        payout_info: None,
        inspection_tasks: default_inspection_tasks(),
        interactive_inspection: BTreeMap::new(),
        damage_notes: None,
        ai_damage_report: None,
        comments: Vec::new(),
        next_comment_seq: 0,
        review: None,
    };

    let open_no_bids = Job {
        id: "job-KLMNO".into(),
        vehicle: vehicle(
            "Porsche",
            "911",
            2022,
            "KLMNOVIN789",
            "job-KLMNO",
            CarType::Big,
            (36.1699, -115.1398, "Ikeja, Lagos State, Nigeria"),
        ),
        client: party(&users, "user-1"),
        valuer: None,
        status: JobStatus::OpenForBids,
        created_at: date(2023, 10, 30),
        open_bidding: true,
        report_url: None,
        report_outdated: false,
        photos: Vec::new(),
        videos: Vec::new(),
        documents: Vec::new(),
        signatures: Signatures::default(),
        bids: Vec::new(),
        notes: None,
        payment_info: paid(6000, date(2023, 10, 30)),
        payout_info: None,
        inspection_tasks: default_inspection_tasks(),
        interactive_inspection: BTreeMap::new(),
        damage_notes: None,
        ai_damage_report: None,
        comments: Vec::new(),
        next_comment_seq: 0,
        review: None,
    };

    vec![in_progress, completed, open_with_bid, unassigned, open_no_bids]
}
