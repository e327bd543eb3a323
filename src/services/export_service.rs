use chrono::{DateTime, Utc};
use rust_xlsxwriter::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    cycle::SubmissionCycle,
    submission::{Submission, SubmissionStatus},
};
use crate::store::Versioned;

pub struct ExportService;

impl ExportService {
    fn status_color(status: SubmissionStatus) -> Color {
        match status {
            SubmissionStatus::Pending => Color::RGB(0x3B82F6),   // Blue
            SubmissionStatus::Flagged => Color::RGB(0xF59E0B),   // Amber
            SubmissionStatus::Approved => Color::RGB(0x10B981),  // Emerald
            SubmissionStatus::Completed => Color::RGB(0x8B5CF6), // Violet
            SubmissionStatus::Rejected => Color::RGB(0xEF4444),  // Red
        }
    }

    /// Styled XLSX report of internship submissions for the SCAD office.
    pub fn generate_submissions_xlsx(
        submissions: &[Versioned<Submission>],
        cycles: &HashMap<Uuid, SubmissionCycle>,
        generated_at: DateTime<Utc>,
    ) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Submissions")?;

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        let columns = [
            ("#", 6.0),
            ("Student", 28.0),
            ("Company", 30.0),
            ("Supervisor", 26.0),
            ("Cycle", 18.0),
            ("Status", 14.0),
            ("Faculty assigned", 38.0),
            ("Submitted", 18.0),
            ("Documents", 12.0),
            ("Latest feedback", 50.0),
            ("History", 60.0),
        ];
        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }
        let last_col = (columns.len() - 1) as u16;

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, last_col, "Internship submissions report", &title_format)?;

        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(1, 22)?;
        let subtitle = format!(
            "Generated {}  •  {} submissions",
            generated_at.format("%Y-%m-%d %H:%M UTC"),
            submissions.len()
        );
        worksheet.merge_range(1, 0, 1, last_col, &subtitle, &subtitle_format)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 3;
        for (idx, versioned) in submissions.iter().enumerate() {
            let submission = &versioned.record;
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();
            worksheet.set_row_height(row, 22)?;

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            worksheet.write_string_with_format(
                row,
                1,
                &submission.student_name,
                &base_fmt.clone().set_bold(),
            )?;
            worksheet.write_string_with_format(row, 2, &submission.company.company_name, &base_fmt)?;
            worksheet.write_string_with_format(
                row,
                3,
                &format!(
                    "{} <{}>",
                    submission.company.supervisor_name, submission.company.supervisor_email
                ),
                &wrap_fmt,
            )?;
            let cycle_name = cycles
                .get(&submission.cycle_id)
                .map(|c| c.name.as_str())
                .unwrap_or("—");
            worksheet.write_string_with_format(row, 4, cycle_name, &center_fmt)?;

            let status_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Self::status_color(submission.status))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_string_with_format(row, 5, submission.status.as_str(), &status_fmt)?;

            let faculty = submission
                .faculty_assigned
                .map(|id| id.to_string())
                .unwrap_or_else(|| "unassigned".to_string());
            worksheet.write_string_with_format(row, 6, &faculty, &center_fmt)?;
            worksheet.write_string_with_format(
                row,
                7,
                &submission.submission_date.format("%Y-%m-%d %H:%M").to_string(),
                &center_fmt,
            )?;
            worksheet.write_number_with_format(
                row,
                8,
                submission.documents.len() as f64,
                &center_fmt,
            )?;
            worksheet.write_string_with_format(
                row,
                9,
                submission.feedback.as_deref().unwrap_or("—"),
                &wrap_fmt,
            )?;

            // Most recent five entries keep the cell readable.
            let history: Vec<String> = submission
                .timeline
                .iter()
                .rev()
                .take(5)
                .map(|entry| {
                    let what = entry
                        .action
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "created".to_string());
                    format!(
                        "{} {} by {} -> {}",
                        entry.timestamp.format("%m-%d"),
                        what,
                        entry.actor_role,
                        entry.to
                    )
                })
                .collect();
            worksheet.write_string_with_format(row, 10, &history.join("\n"), &wrap_fmt)?;
        }

        let total_row = data_start_row + submissions.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        worksheet.set_row_height(total_row, 26)?;
        worksheet.merge_range(
            total_row,
            0,
            total_row,
            1,
            &format!("Total: {}", submissions.len()),
            &summary_fmt,
        )?;

        let count = |status: SubmissionStatus| {
            submissions
                .iter()
                .filter(|s| s.record.status == status)
                .count()
        };
        let status_summary = format!(
            "Pending: {} | Flagged: {} | Approved: {} | Rejected: {} | Completed: {}",
            count(SubmissionStatus::Pending),
            count(SubmissionStatus::Flagged),
            count(SubmissionStatus::Approved),
            count(SubmissionStatus::Rejected),
            count(SubmissionStatus::Completed),
        );
        worksheet.merge_range(total_row, 2, total_row, 6, &status_summary, &summary_fmt)?;

        let unassigned = submissions
            .iter()
            .filter(|s| s.record.faculty_assigned.is_none())
            .count();
        worksheet.merge_range(
            total_row,
            7,
            total_row,
            last_col,
            &format!("Awaiting faculty assignment: {}", unassigned),
            &summary_fmt,
        )?;

        worksheet.set_freeze_panes(3, 0)?;
        worksheet.autofilter(
            2,
            0,
            (data_start_row + submissions.len() as u32).saturating_sub(1).max(2),
            last_col,
        )?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
