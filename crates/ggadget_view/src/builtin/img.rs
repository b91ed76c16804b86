//! `<img>`: draws an image stretched to the element's size
//!
//! Unless width or height is set, the element takes the image's natural size.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ggadget_core::{Canvas, Image};

use crate::behavior::ElementBehavior;
use crate::tree::ElementId;
use crate::view::View;

#[derive(Default)]
pub struct ImgElement {
    src: RefCell<String>,
    image: RefCell<Option<Rc<dyn Image>>>,
}

impl ImgElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src(&self) -> String {
        self.src.borrow().clone()
    }

    /// Load `src` through the view's image loader
    ///
    /// A missing image leaves the element empty with a zero default size.
    pub fn set_src(&self, view: &mut View, id: ElementId, src: &str) {
        if *self.src.borrow() == src {
            return;
        }
        view.queue_draw_element(id);
        *self.src.borrow_mut() = src.to_string();
        *self.image.borrow_mut() = view.load_image(src, false);
        view.default_size_changed(id);
        view.queue_draw_element(id);
    }

    pub fn has_image(&self) -> bool {
        self.image.borrow().is_some()
    }

    /// Natural size of the image, zero when none is loaded
    pub fn image_size(&self) -> (f64, f64) {
        self.image
            .borrow()
            .as_ref()
            .map_or((0.0, 0.0), |image| (image.width(), image.height()))
    }
}

impl fmt::Debug for ImgElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgElement")
            .field("src", &*self.src.borrow())
            .field("size", &self.image_size())
            .finish()
    }
}

impl ElementBehavior for ImgElement {
    fn tag_name(&self) -> &'static str {
        "img"
    }

    fn default_size(&self, _view: &View, _id: ElementId) -> (f64, f64) {
        self.image_size()
    }

    fn do_draw(&self, view: &mut View, id: ElementId, canvas: &mut dyn Canvas) {
        let Some(image) = self.image.borrow().clone() else {
            return;
        };
        image.draw(canvas, 0.0, 0.0, view.pixel_width(id), view.pixel_height(id));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use ggadget_core::{BitmapImage, Color, DrawCommand, MemoryImageLoader};

    use super::*;
    use crate::testing::{last_frame, test_view};

    fn view_with_images() -> View {
        let (mut view, _, _) = test_view();
        let mut loader = MemoryImageLoader::new();
        loader.insert("logo.png", Rc::new(BitmapImage::filled(16, 8, Color::WHITE, 1.0)));
        view.set_image_loader(Rc::new(loader));
        view
    }

    fn img_of(view: &View, id: ElementId) -> Rc<dyn ElementBehavior> {
        view.behavior(id).unwrap()
    }

    #[test]
    fn test_natural_size_from_image() {
        let mut view = view_with_images();
        let id = view.append_element(None, "img", "logo").unwrap();
        let behavior = img_of(&view, id);
        let img = behavior.downcast_ref::<ImgElement>().unwrap();
        assert_eq!((view.pixel_width(id), view.pixel_height(id)), (0.0, 0.0));
        view.draw().unwrap();
        assert!(!view.is_size_changed(id));

        img.set_src(&mut view, id, "logo.png");
        assert!(img.has_image());
        assert_eq!((view.pixel_width(id), view.pixel_height(id)), (16.0, 8.0));
        assert!(view.is_size_changed(id));

        view.set_width(id, 32.0);
        assert_eq!((view.pixel_width(id), view.pixel_height(id)), (32.0, 8.0));
    }

    #[test]
    fn test_draws_stretched_image() {
        let mut view = view_with_images();
        let id = view.append_element(None, "img", "").unwrap();
        view.set_width(id, 40.0);
        let behavior = img_of(&view, id);
        let img = behavior.downcast_ref::<ImgElement>().unwrap();
        img.set_src(&mut view, id, "logo.png");

        let commands = last_frame(&mut view);
        assert!(commands.iter().any(|c| matches!(
            c,
            DrawCommand::Image { width, height, .. } if *width == 40.0 && *height == 8.0
        )));
    }

    #[test]
    fn test_missing_image_draws_nothing() {
        let mut view = view_with_images();
        let id = view.append_element(None, "img", "").unwrap();
        view.set_width(id, 10.0);
        view.set_height(id, 10.0);
        let behavior = img_of(&view, id);
        let img = behavior.downcast_ref::<ImgElement>().unwrap();
        img.set_src(&mut view, id, "missing.png");
        assert!(!img.has_image());
        assert_eq!(img.src(), "missing.png");

        let commands = last_frame(&mut view);
        assert!(!commands.iter().any(|c| matches!(c, DrawCommand::Image { .. })));
    }

    #[test]
    fn test_img_rejects_children() {
        let (mut view, _, _) = test_view();
        let id = view.append_element(None, "img", "").unwrap();
        assert!(view.append_element(Some(id), "div", "").is_err());
    }
}
