// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end capture sessions driven through the controller with in-memory
// collaborators.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;
use std::rc::Rc;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use pagescan_bridge::{AssemblyPage, DocumentAssembler, EdgeDetector, NativeCamera, NativeHaptics};
use pagescan_capture::{CaptureController, Collaborators, Key, Phase, ReviewEvent};
use pagescan_core::config::ScanConfig;
use pagescan_core::error::{Result, ScanError};
use pagescan_core::human_errors::humanize_error;
use pagescan_core::types::{PageStatus, Point, Quad, Rotation};

/// Detects a fixed inset quad, except on images narrower than 100px.
struct InsetDetector;

impl EdgeDetector for InsetDetector {
    fn detect(&self, image: &DynamicImage) -> Option<Quad> {
        if image.width() < 100 {
            return None;
        }
        let (w, h) = (image.width() as f32, image.height() as f32);
        Some(Quad {
            top_left: Point::new(8.0, 8.0),
            top_right: Point::new(w - 8.0, 8.0),
            bottom_left: Point::new(8.0, h - 8.0),
            bottom_right: Point::new(w - 8.0, h - 8.0),
        })
    }
}

#[derive(Clone, Default)]
struct Assembler {
    calls: Rc<RefCell<Vec<(Vec<AssemblyPage>, String)>>>,
    fail: Rc<RefCell<bool>>,
}

impl DocumentAssembler for Assembler {
    fn assemble(&self, pages: &[AssemblyPage], file_name: &str) -> Result<()> {
        if *self.fail.borrow() {
            return Err(ScanError::Assembly("disk full".into()));
        }
        self.calls.borrow_mut().push((pages.to_vec(), file_name.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Haptics {
    pulses: Rc<RefCell<u32>>,
}

impl NativeHaptics for Haptics {
    fn impact(&self) -> Result<()> {
        *self.pulses.borrow_mut() += 1;
        Ok(())
    }
}

struct QueueCamera(RefCell<VecDeque<Vec<u8>>>);

impl NativeCamera for QueueCamera {
    fn capture_page(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.0.borrow_mut().pop_front())
    }
}

fn page_png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _| Luma([shade.wrapping_add((x % 64) as u8)]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img).write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

struct Session {
    ctl: CaptureController,
    assembler: Assembler,
    haptics: Haptics,
}

fn session() -> Session {
    let assembler = Assembler::default();
    let haptics = Haptics::default();
    let ctl = CaptureController::new(
        ScanConfig::default(),
        Collaborators {
            detector: Box::new(InsetDetector),
            assembler: Box::new(assembler.clone()),
            haptics: Box::new(haptics.clone()),
        },
        "Acme Corp",
    );
    Session {
        ctl,
        assembler,
        haptics,
    }
}

fn capture_and_process(ctl: &mut CaptureController, pages: Vec<Vec<u8>>) {
    let camera = QueueCamera(RefCell::new(pages.into()));
    ctl.capture_from(&camera).unwrap();
    ctl.finish_capture().unwrap();
    ctl.process_all().unwrap();
    assert_eq!(*ctl.phase(), Phase::Reviewing);
}

#[test]
fn three_pages_one_retake_mark_goes_to_naming() {
    let Session { mut ctl, assembler, .. } = session();
    capture_and_process(
        &mut ctl,
        vec![page_png(160, 200, 10), page_png(160, 200, 60), page_png(160, 200, 110)],
    );

    let id = ctl.page(2).unwrap().id;
    ctl.on_mark_retake(id).unwrap();
    assert_eq!(ctl.grid().retake_label().as_deref(), Some("Retake 1 Page"));

    ctl.on_continue().unwrap();
    assert_eq!(*ctl.phase(), Phase::Naming);
    assert_eq!(ctl.namer().unwrap().value(), "Acme Corp - ");

    let file = ctl.on_submit("Acme Corp - ").unwrap();
    assert_eq!(file, "Acme Corp -.pdf");

    let calls = assembler.calls.borrow();
    assert_eq!(calls.len(), 1);
    let numbers: Vec<u32> = calls[0].0.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn narrow_capture_enters_review_with_error_badge() {
    let Session { mut ctl, .. } = session();
    capture_and_process(&mut ctl, vec![page_png(160, 200, 0), page_png(80, 200, 0)]);

    assert_eq!(ctl.page(1).unwrap().status, PageStatus::Ready);
    let failed = ctl.page(2).unwrap();
    assert_eq!(failed.status, PageStatus::Error);
    assert!(failed.detected_edges.is_none());
    assert_eq!(
        ctl.grid().badge(2),
        Some(pagescan_capture::Badge::Error)
    );
}

#[test]
fn swipe_delete_keeps_other_page_numbers() {
    let Session { mut ctl, assembler, .. } = session();
    capture_and_process(
        &mut ctl,
        (0..4).map(|i| page_png(120, 120, i * 30)).collect(),
    );

    let id = ctl.page(3).unwrap().id;
    ctl.swipe_start(id, &[Point::new(300.0, 100.0)]).unwrap();
    let event = ctl.swipe_end(Point::new(200.0, 104.0)).unwrap();
    assert_eq!(event, Some(ReviewEvent::DeleteRequested(3)));
    assert_eq!(ctl.page_count(), 4);

    assert_eq!(ctl.confirm_delete().unwrap(), Some(3));
    assert_eq!(ctl.grid().pages().numbers(), vec![1, 2, 4]);

    ctl.review_key(Key::Enter).unwrap();
    ctl.on_submit("Invoices").unwrap();
    let calls = assembler.calls.borrow();
    let numbers: Vec<u32> = calls[0].0.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 4]);
}

#[test]
fn right_swipe_marks_retake_with_haptic_pulse() {
    let Session { mut ctl, haptics, .. } = session();
    capture_and_process(&mut ctl, vec![page_png(120, 120, 0), page_png(120, 120, 0)]);

    let id = ctl.page(1).unwrap().id;
    ctl.swipe_start(id, &[Point::new(10.0, 10.0)]).unwrap();
    let event = ctl.swipe_end(Point::new(90.0, 12.0)).unwrap();
    assert_eq!(event, Some(ReviewEvent::SwipedToRetake(1)));
    assert!(ctl.page(1).unwrap().marked_for_retake);
    assert_eq!(*haptics.pulses.borrow(), 1);
}

#[test]
fn retake_replaces_marked_pages_in_place() {
    let Session { mut ctl, .. } = session();
    capture_and_process(
        &mut ctl,
        vec![page_png(120, 120, 0), page_png(80, 120, 0), page_png(120, 120, 0)],
    );
    let id = ctl.page(2).unwrap().id;
    assert_eq!(ctl.page(2).unwrap().status, PageStatus::Error);
    ctl.on_rotate(id).unwrap();

    ctl.review_key(Key::ArrowRight).unwrap();
    assert_eq!(
        ctl.review_key(Key::Char('r')).unwrap(),
        Some(ReviewEvent::RetakeToggled { page_number: 2, marked: true })
    );
    ctl.on_retake().unwrap();
    assert_eq!(ctl.retake_queue(), vec![2]);

    // The camera offers more than needed; only the marked slot is filled.
    capture_and_process(&mut ctl, vec![page_png(150, 120, 0), page_png(150, 120, 0)]);

    let page = ctl.page(2).unwrap();
    assert_eq!(page.id, id);
    assert_eq!(page.width, 150);
    assert_eq!(page.status, PageStatus::Ready);
    assert_eq!(page.rotation, Rotation::Deg90);
    assert_eq!(ctl.page_count(), 3);
    assert_eq!(ctl.grid().retake_label(), None);
}

#[test]
fn crop_adjustment_via_editor() {
    let Session { mut ctl, .. } = session();
    capture_and_process(&mut ctl, vec![page_png(200, 200, 0), page_png(200, 200, 0)]);

    ctl.review_key(Key::Char('c')).unwrap();
    ctl.review_key(Key::Enter).unwrap();
    assert_eq!(*ctl.phase(), Phase::CropAdjustment { page_number: 1 });

    // Drag the bottom-right handle inward at 1:1 display scale.
    let editor = ctl.crop_editor_mut().unwrap();
    assert!(editor.begin_drag(Point::new(192.0, 192.0)));
    editor.drag_to(Point::new(120.0, 150.0));
    editor.end_gesture();
    let before = ctl.page(1).unwrap().preview.clone();

    assert!(matches!(
        ctl.crop_key(Key::Enter).unwrap(),
        Some(pagescan_capture::CropOutcome::Apply(_))
    ));
    let page = ctl.page(1).unwrap();
    assert_eq!((page.crop_area.right(), page.crop_area.bottom()), (120.0, 150.0));
    assert!(!page.marked_for_crop);
    assert_ne!(page.preview, before);
    assert_eq!(*ctl.phase(), Phase::Reviewing);
}

#[test]
fn cancel_during_processing_produces_nothing() {
    let Session { mut ctl, assembler, .. } = session();
    for shade in [0, 50, 100] {
        ctl.capture_page(page_png(120, 120, shade)).unwrap();
    }
    ctl.finish_capture().unwrap();
    ctl.process_next().unwrap();

    ctl.on_cancel().unwrap();
    ctl.dismiss_cancel();
    ctl.process_next().unwrap();

    ctl.on_cancel().unwrap();
    assert!(matches!(ctl.confirm_cancel(), Err(ScanError::CancellationConfirmed)));
    assert_eq!(*ctl.phase(), Phase::Cancelled);
    assert_eq!(ctl.page_count(), 0);
    assert!(ctl.on_continue().is_err());
    assert!(assembler.calls.borrow().is_empty());
}

#[test]
fn assembly_failure_returns_to_naming() {
    let Session { mut ctl, assembler, .. } = session();
    capture_and_process(&mut ctl, vec![page_png(120, 120, 0)]);
    ctl.on_continue().unwrap();

    *assembler.fail.borrow_mut() = true;
    assert!(matches!(ctl.on_submit("Report"), Err(ScanError::Assembly(_))));
    assert_eq!(*ctl.phase(), Phase::Naming);

    *assembler.fail.borrow_mut() = false;
    assert_eq!(ctl.on_submit("Report").unwrap(), "Report.pdf");
}

#[test]
fn empty_capture_cannot_continue() {
    let Session { mut ctl, .. } = session();
    ctl.finish_capture().unwrap();
    assert_eq!(*ctl.phase(), Phase::Reviewing);
    assert!(matches!(ctl.on_continue(), Err(ScanError::NothingToProcess(_))));
    assert_eq!(ctl.review_key(Key::Enter).unwrap(), None);
}

#[test]
fn deleting_every_page_is_reported_without_asking_for_a_name() {
    let Session { mut ctl, .. } = session();
    capture_and_process(&mut ctl, vec![page_png(120, 120, 0)]);
    let id = ctl.page(1).unwrap().id;
    ctl.on_delete(id).unwrap();
    ctl.confirm_delete().unwrap();

    let err = ctl.on_continue().unwrap_err();
    assert!(matches!(err, ScanError::NothingToProcess(_)));
    let human = humanize_error(&err);
    assert!(!human.suggestion.contains("name"));

    let human = humanize_error(&ctl.on_retake().unwrap_err());
    assert!(!human.suggestion.contains("name"));
}

#[test]
fn unconfirmed_delete_does_not_survive_leaving_review() {
    let Session { mut ctl, .. } = session();
    capture_and_process(
        &mut ctl,
        vec![page_png(120, 120, 0), page_png(120, 120, 40), page_png(120, 120, 80)],
    );
    let id = ctl.page(2).unwrap().id;
    ctl.on_delete(id).unwrap();
    assert_eq!(ctl.grid().pending_delete(), Some(2));

    ctl.on_continue().unwrap();
    assert_eq!(*ctl.phase(), Phase::Naming);
    ctl.naming_key(Key::Escape).unwrap();
    assert_eq!(*ctl.phase(), Phase::Reviewing);
    assert_eq!(ctl.grid().pending_delete(), None);

    assert_eq!(ctl.review_key(Key::Enter).unwrap(), Some(ReviewEvent::Continue));
    assert_eq!(*ctl.phase(), Phase::Naming);
    assert_eq!(ctl.grid().pages().numbers(), vec![1, 2, 3]);
}

#[test]
fn manual_crop_clears_detection_error() {
    let Session { mut ctl, .. } = session();
    capture_and_process(&mut ctl, vec![page_png(80, 200, 0)]);
    assert_eq!(ctl.grid().badge(1), Some(pagescan_capture::Badge::Error));

    let id = ctl.page(1).unwrap().id;
    ctl.on_mark_crop(id).unwrap();
    ctl.on_continue().unwrap();
    assert_eq!(*ctl.phase(), Phase::CropAdjustment { page_number: 1 });
    ctl.apply_editor().unwrap();

    assert_eq!(ctl.page(1).unwrap().status, PageStatus::Ready);
    assert_eq!(ctl.grid().badge(1), Some(pagescan_capture::Badge::Ready));
}

#[test]
fn identical_input_gives_identical_previews() {
    let Session { mut ctl, .. } = session();
    let bytes = page_png(140, 110, 33);
    capture_and_process(&mut ctl, vec![bytes.clone(), bytes]);
    assert_eq!(ctl.page(1).unwrap().preview, ctl.page(2).unwrap().preview);
}
